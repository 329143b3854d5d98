//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any [`roster_core::store::Directory`].
//! CORS, request tracing and the listener are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(store.clone(), ApiOptions::default()))
//! ```

pub mod entities;
pub mod envelope;
pub mod error;
pub mod members;
pub mod system;

use std::sync::Arc;

use axum::{Router, routing::get};
use roster_core::{
  Classify, department::Department, person::Person, rank::Rank, store::Directory,
};
use serde::Deserialize;

pub use envelope::Envelope;
pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Behaviour switches for the handlers.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiOptions {
  /// Serve the static demo records when a person or rank listing fails.
  #[serde(default)]
  pub demo_fallback: bool,
  /// Include the raw error text in 500 responses.
  #[serde(default = "default_true")]
  pub expose_errors: bool,
}

fn default_true() -> bool { true }

impl Default for ApiOptions {
  fn default() -> Self { Self { demo_fallback: false, expose_errors: true } }
}

/// Shared handler state.
pub struct ApiState<S> {
  pub store:   Arc<S>,
  pub options: Arc<ApiOptions>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), options: self.options.clone() }
  }
}

impl<S> ApiState<S> {
  /// Turn a backend error into a response, reporting 500s under `context`.
  pub fn fail<E>(&self, err: E, context: impl Into<String>) -> ApiError
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    ApiError::from_store(err, context, self.options.expose_errors)
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, options: ApiOptions) -> Router<()>
where
  S: Directory + 'static,
{
  let state = ApiState { store, options: Arc::new(options) };

  Router::new()
    // Persons
    .route(
      "/persons",
      get(entities::list::<S, Person>).post(entities::create::<S, Person>),
    )
    .route("/persons/active", get(entities::list_active::<S, Person>))
    .route("/persons/next-id/generate", get(members::next_person_id::<S>))
    .route(
      "/persons/department/{dept_id}/persons",
      get(members::persons_by_department::<S>),
    )
    .route("/persons/rank/{rank_id}/persons", get(members::persons_by_rank::<S>))
    .route(
      "/persons/{id}",
      get(entities::get_one::<S, Person>)
        .put(entities::update::<S, Person>)
        .delete(entities::delete::<S, Person>),
    )
    // Departments
    .route(
      "/departments",
      get(entities::list::<S, Department>)
        .post(entities::create::<S, Department>),
    )
    .route("/departments/active", get(entities::list_active::<S, Department>))
    .route(
      "/departments/{id}",
      get(entities::get_one::<S, Department>)
        .put(entities::update::<S, Department>)
        .delete(entities::delete::<S, Department>),
    )
    .route("/departments/{id}/persons", get(members::department_persons::<S>))
    // Ranks
    .route(
      "/ranks",
      get(entities::list::<S, Rank>).post(entities::create::<S, Rank>),
    )
    .route("/ranks/active", get(entities::list_active::<S, Rank>))
    .route(
      "/ranks/{id}",
      get(entities::get_one::<S, Rank>)
        .put(entities::update::<S, Rank>)
        .delete(entities::delete::<S, Rank>),
    )
    .route("/ranks/{id}/persons", get(members::rank_persons::<S>))
    // Connectivity
    .route("/test-connection", get(system::test_connection::<S>))
    .method_not_allowed_fallback(system::method_not_allowed)
    .with_state(state)
}

#[cfg(test)]
mod tests;
