//! Error types for `roster-core`.

use thiserror::Error;

use crate::entity::EntityKind;

#[derive(Debug, Error)]
pub enum Error {
  /// A create body is missing fields, or a value is out of range.
  #[error("{0}")]
  Validation(String),

  #[error("{} not found", .0.label())]
  NotFound(EntityKind, String),

  #[error("{} ID already exists", .0.label())]
  DuplicateKey(EntityKind, String),

  /// A column other than the key that must be unique already holds the value.
  /// Carries the display label of the field, e.g. `"Username"`.
  #[error("{0} already exists")]
  DuplicateField(&'static str),

  #[error(
    "Cannot delete {}. It is being used by one or more persons.",
    .0.singular()
  )]
  InUse(EntityKind, String),

  #[error("No fields to update")]
  NothingToUpdate,

  #[error("referenced department or rank does not exist")]
  UnknownReference,

  #[error("{} ID space exhausted", .0.label())]
  KeySpaceExhausted(EntityKind),

  #[error("unknown system permission: {0:?}")]
  UnknownPermission(String),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

/// How a failure should be reported to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The request was malformed; nothing was changed.
  Invalid,
  NotFound,
  /// Duplicate key/field, or a delete blocked by a dependent row.
  Conflict,
  /// The backend failed; the request may or may not have been applied.
  Internal,
}

/// Implemented by every error type a storage backend can return, so that
/// transport layers can pick a status without knowing the backend.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) | Self::NothingToUpdate | Self::UnknownReference => {
        ErrorKind::Invalid
      }
      Self::NotFound(..) => ErrorKind::NotFound,
      Self::DuplicateKey(..)
      | Self::DuplicateField(_)
      | Self::InUse(..)
      | Self::KeySpaceExhausted(_) => ErrorKind::Conflict,
      Self::UnknownPermission(_) | Self::PasswordHash(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
