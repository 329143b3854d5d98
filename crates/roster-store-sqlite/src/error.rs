//! Error type for `roster-store-sqlite`.

use std::time::Duration;

use roster_core::{Classify, ErrorKind};
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] roster_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("timed out after {0:?} waiting for a database connection")]
  AcquireTimeout(Duration),

  #[error("connection pool is closed")]
  PoolClosed,

  #[error("configuration error: {0}")]
  Config(String),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      _ => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Constraint violations ───────────────────────────────────────────────────

/// Which schema constraint rejected a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Violation {
  PrimaryKey,
  /// Carries SQLite's message, e.g. `UNIQUE constraint failed: persons.username`.
  Unique(String),
  ForeignKey,
  Other,
}

impl Error {
  pub(crate) fn violation(&self) -> Option<Violation> {
    let (err, msg) = match self {
      Self::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(err, msg),
      ))
      | Self::Sqlite(rusqlite::Error::SqliteFailure(err, msg)) => (err, msg),
      _ => return None,
    };
    if err.code != rusqlite::ErrorCode::ConstraintViolation {
      return None;
    }
    Some(match err.extended_code {
      ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Violation::PrimaryKey,
      ffi::SQLITE_CONSTRAINT_UNIQUE => {
        Violation::Unique(msg.clone().unwrap_or_default())
      }
      ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Violation::ForeignKey,
      _ => Violation::Other,
    })
  }
}
