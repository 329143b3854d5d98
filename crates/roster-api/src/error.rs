//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use roster_core::{Classify, ErrorKind};
use thiserror::Error;

use crate::envelope::Envelope;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request was refused; `message` is shown to the client as-is.
  #[error("{message}")]
  Rejected {
    status:  StatusCode,
    message: String,
    detail:  Option<String>,
  },

  /// The backend failed. `context` names the operation.
  #[error("{context}: {source}")]
  Internal {
    context: String,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
    /// Whether the raw error text goes into the response body.
    expose:  bool,
  },
}

impl ApiError {
  pub fn not_found(message: impl Into<String>) -> Self {
    Self::Rejected { status: StatusCode::NOT_FOUND, message: message.into(), detail: None }
  }

  /// A body that could not be parsed into the expected shape.
  pub fn body(rejection: JsonRejection) -> Self {
    Self::Rejected {
      status:  StatusCode::BAD_REQUEST,
      message: "Invalid request body".into(),
      detail:  Some(rejection.body_text()),
    }
  }

  /// Map a backend error by its [`ErrorKind`]: client mistakes keep their own
  /// message, anything else becomes a 500 reported under `context`.
  pub fn from_store<E>(err: E, context: impl Into<String>, expose: bool) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    let status = match err.kind() {
      ErrorKind::Invalid => StatusCode::BAD_REQUEST,
      ErrorKind::NotFound => StatusCode::NOT_FOUND,
      ErrorKind::Conflict => StatusCode::CONFLICT,
      ErrorKind::Internal => {
        return Self::Internal {
          context: context.into(),
          source: Box::new(err),
          expose,
        };
      }
    };
    Self::Rejected { status, message: err.to_string(), detail: None }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Rejected { status, .. } => *status,
      Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match self {
      Self::Rejected { message, detail, .. } => Envelope::failure(message, detail),
      Self::Internal { context, source, expose } => {
        tracing::error!(error = %source, "{context}");
        Envelope::failure(context, expose.then(|| source.to_string()))
      }
    };
    (status, Json(body)).into_response()
  }
}
