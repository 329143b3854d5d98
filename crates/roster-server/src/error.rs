//! Startup errors for the server library.

use axum::http::header::InvalidHeaderValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid CORS origin {origin:?}: {source}")]
  CorsOrigin {
    origin: String,
    #[source]
    source: InvalidHeaderValue,
  },
}
