//! HTTP server for Roster.
//!
//! Mounts the JSON API under `/api` next to the health and banner routes,
//! and wraps everything in request tracing and CORS.

pub mod error;

pub use error::Error;

use std::{sync::Arc, time::Duration};

use axum::{
  Json, Router,
  extract::OriginalUri,
  http::{
    HeaderValue, Method, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE},
  },
  response::IntoResponse,
  routing::get,
};
use chrono::{SecondsFormat, Utc};
use roster_api::ApiOptions;
use roster_core::store::Directory;
use roster_store_sqlite::DatabaseConfig;
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const SERVICE: &str = "Roster API Server";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROSTER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  #[serde(default = "default_cors_origins")]
  pub cors_origins:  Vec<String>,
  #[serde(default)]
  pub demo_fallback: bool,
  #[serde(default = "default_expose_errors")]
  pub expose_errors: bool,
  #[serde(default)]
  pub database:      DatabaseConfig,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3001 }
fn default_expose_errors() -> bool { true }

/// The Vite and React dev servers.
fn default_cors_origins() -> Vec<String> {
  [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:5174",
    "http://127.0.0.1:5174",
    "http://localhost:3000",
  ]
  .map(String::from)
  .to_vec()
}

impl ServerConfig {
  pub fn api_options(&self) -> ApiOptions {
    ApiOptions {
      demo_fallback: self.demo_fallback,
      expose_errors: self.expose_errors,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Result<Router, Error>
where
  S: Directory + 'static,
{
  let cors = build_cors_layer(&config.cors_origins)?;
  Ok(
    Router::new()
      .route("/", get(banner))
      .route("/health", get(health))
      .nest("/api", roster_api::api_router(store, config.api_options()))
      .fallback(not_found)
      .layer(TraceLayer::new_for_http())
      .layer(cors),
  )
}

fn build_cors_layer(origins: &[String]) -> Result<CorsLayer, Error> {
  let origins = origins
    .iter()
    .map(|origin| {
      origin.parse::<HeaderValue>().map_err(|source| Error::CorsOrigin {
        origin: origin.clone(),
        source,
      })
    })
    .collect::<Result<Vec<_>, _>>()?;

  Ok(
    CorsLayer::new()
      .allow_origin(origins)
      .allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
      ])
      .allow_headers([CONTENT_TYPE, AUTHORIZATION])
      .allow_credentials(true)
      .max_age(Duration::from_secs(3600)),
  )
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /health`
async fn health() -> impl IntoResponse {
  Json(json!({
    "status": "OK",
    "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    "service": SERVICE,
  }))
}

/// `GET /`
async fn banner() -> impl IntoResponse {
  Json(json!({
    "message": format!("{SERVICE} is running"),
    "version": env!("CARGO_PKG_VERSION"),
    "endpoints": {
      "health": "/health",
      "testConnection": "/api/test-connection",
      "persons": "/api/persons",
      "departments": "/api/departments",
      "ranks": "/api/ranks",
    },
  }))
}

async fn not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
  (
    StatusCode::NOT_FOUND,
    Json(json!({
      "success": false,
      "message": "Route not found",
      "path": uri.path(),
    })),
  )
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use roster_store_sqlite::SqliteStore;
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::*;

  fn config() -> ServerConfig {
    serde_json::from_value(json!({})).unwrap()
  }

  async fn make_app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    app(Arc::new(store), &config()).unwrap()
  }

  async fn oneshot(
    app: Router,
    method: &str,
    uri: &str,
    headers: Vec<(&str, &str)>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[test]
  fn defaults_fill_an_empty_config() {
    let cfg = config();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 3001);
    assert_eq!(cfg.cors_origins.len(), 5);
    assert!(!cfg.demo_fallback);
    assert!(cfg.expose_errors);
    assert_eq!(cfg.database.max_connections, 10);
    assert!(cfg.database.target().is_err());
  }

  #[test]
  fn bad_cors_origin_is_rejected() {
    let err = build_cors_layer(&["bad\norigin".to_owned()]).unwrap_err();
    assert!(matches!(err, Error::CorsOrigin { .. }));
  }

  #[tokio::test]
  async fn health_reports_ok() {
    let resp = oneshot(make_app().await, "GET", "/health", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["service"], SERVICE);
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
  }

  #[tokio::test]
  async fn banner_lists_endpoints() {
    let resp = oneshot(make_app().await, "GET", "/", vec![]).await;
    let body = json_body(resp).await;
    assert_eq!(body["message"], "Roster API Server is running");
    assert_eq!(body["endpoints"]["persons"], "/api/persons");
  }

  #[tokio::test]
  async fn api_is_nested() {
    let resp = oneshot(make_app().await, "GET", "/api/ranks", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["message"], "Ranks retrieved successfully");
  }

  #[tokio::test]
  async fn unknown_route_is_404_with_path() {
    let resp = oneshot(make_app().await, "GET", "/api/nothing/here", vec![]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body, json!({
      "success": false,
      "message": "Route not found",
      "path": "/api/nothing/here",
    }));
  }

  #[tokio::test]
  async fn cors_allows_dev_origin() {
    let resp = oneshot(
      make_app().await,
      "OPTIONS",
      "/api/persons",
      vec![
        ("origin", "http://localhost:5173"),
        ("access-control-request-method", "POST"),
      ],
    )
    .await;
    assert_eq!(
      resp.headers().get("access-control-allow-origin").unwrap(),
      "http://localhost:5173"
    );
  }
}
