//! The `{ success, data?, message, error? }` body every API response uses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data:    Option<T>,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:   Option<String>,
}

impl<T> Envelope<T> {
  pub fn ok(data: T, message: impl Into<String>) -> Self {
    Self { success: true, data: Some(data), message: message.into(), error: None }
  }
}

impl Envelope<()> {
  /// A success with nothing but a message (updates and deletes).
  pub fn done(message: impl Into<String>) -> Self {
    Self { success: true, data: None, message: message.into(), error: None }
  }

  pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
    Self { success: false, data: None, message: message.into(), error }
  }
}
