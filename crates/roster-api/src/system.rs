//! `GET /test-connection` and the method-not-allowed fallback.

use axum::{Json, extract::State, http::StatusCode};
use roster_core::store::Backend;
use serde_json::{Value, json};

use crate::{ApiState, envelope::Envelope, error::ApiError};

/// `GET /test-connection`: a database round trip.

pub async fn test_connection<S: Backend>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Envelope<Value>>, ApiError> {
  match state.store.ping().await {
    Ok(now) => Ok(Json(Envelope::ok(
      json!({ "currentTime": now, "status": "Connected" }),
      "Database connection successful",
    ))),
    Err(e) => Err(ApiError::Internal {
      context: "Database connection failed".into(),
      source:  Box::new(e),
      expose:  state.options.expose_errors,
    }),
  }
}

/// A known path hit with a method it does not serve.
pub async fn method_not_allowed() -> (StatusCode, Json<Envelope<()>>) {
  (
    StatusCode::METHOD_NOT_ALLOWED,
    Json(Envelope::failure("Method not allowed", None)),
  )
}
