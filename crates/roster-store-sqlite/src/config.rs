//! Connection settings: where the database lives and how the pool is sized.

use std::{fmt, path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::{Error, Result};

/// Database section of the server configuration.
///
/// Exactly one target is used. Precedence: `connect_string`, then `path`,
/// then `memory`.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
  /// A full SQLite URI, e.g. `file:/var/lib/roster.db?mode=rwc`.
  #[serde(default)]
  pub connect_string:     Option<String>,
  /// Path of the database file; created if missing.
  #[serde(default)]
  pub path:               Option<PathBuf>,
  /// Name of a shared in-memory database, lost when the pool closes.
  #[serde(default)]
  pub memory:             Option<String>,
  #[serde(default = "default_min_connections")]
  pub min_connections:    usize,
  #[serde(default = "default_max_connections")]
  pub max_connections:    usize,
  #[serde(default = "default_increment")]
  pub increment:          usize,
  #[serde(default = "default_timeout_secs")]
  pub acquire_timeout_secs: u64,
  #[serde(default = "default_timeout_secs")]
  pub idle_timeout_secs:  u64,
}

fn default_min_connections() -> usize { 2 }
fn default_max_connections() -> usize { 10 }
fn default_increment() -> usize { 2 }
fn default_timeout_secs() -> u64 { 60 }

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self {
      connect_string:       None,
      path:                 None,
      memory:               None,
      min_connections:      default_min_connections(),
      max_connections:      default_max_connections(),
      increment:            default_increment(),
      acquire_timeout_secs: default_timeout_secs(),
      idle_timeout_secs:    default_timeout_secs(),
    }
  }
}

impl DatabaseConfig {
  /// Resolve the connect target, failing when none is configured.
  pub fn target(&self) -> Result<Target> {
    let non_blank = |s: &&String| !s.trim().is_empty();
    if let Some(uri) = self.connect_string.as_ref().filter(non_blank) {
      return Ok(Target::Uri(uri.clone()));
    }
    if let Some(path) = self.path.as_ref().filter(|p| !p.as_os_str().is_empty()) {
      return Ok(Target::File(path.clone()));
    }
    if let Some(name) = self.memory.as_ref().filter(non_blank) {
      return Ok(Target::Memory(name.clone()));
    }
    Err(Error::Config(
      "no database configured: set database.connect_string, database.path \
       or database.memory"
        .into(),
    ))
  }

  pub fn pool_options(&self) -> PoolOptions {
    PoolOptions {
      min_connections: self.min_connections,
      max_connections: self.max_connections,
      increment:       self.increment,
      acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
      idle_timeout:    Duration::from_secs(self.idle_timeout_secs),
    }
  }
}

// ─── Target ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  Uri(String),
  File(PathBuf),
  /// Shared-cache in-memory database; every pooled connection sees the
  /// same data while at least one of them stays open.
  Memory(String),
}

impl Target {
  /// The string handed to `sqlite3_open_v2` (with URI parsing enabled).
  pub(crate) fn location(&self) -> String {
    match self {
      Self::Uri(uri) => uri.clone(),
      Self::File(path) => path.to_string_lossy().into_owned(),
      Self::Memory(name) => format!("file:{name}?mode=memory&cache=shared"),
    }
  }

  pub(crate) fn is_memory(&self) -> bool { matches!(self, Self::Memory(_)) }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Uri(uri) => write!(f, "{uri}"),
      Self::File(path) => write!(f, "{}", path.display()),
      Self::Memory(name) => write!(f, "memory:{name}"),
    }
  }
}

// ─── Pool sizing ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
  /// Connections opened up front and never pruned.
  pub min_connections: usize,
  /// Upper bound on connections checked out at once.
  pub max_connections: usize,
  /// Connections opened together when the pool has to grow.
  pub increment:       usize,
  /// How long a caller waits for a free connection before giving up.
  pub acquire_timeout: Duration,
  /// Idle connections above `min_connections` older than this are dropped.
  pub idle_timeout:    Duration,
}

impl Default for PoolOptions {
  fn default() -> Self { DatabaseConfig::default().pool_options() }
}

impl PoolOptions {
  pub(crate) fn check(&self, target: &Target) -> Result<()> {
    if self.max_connections == 0 || self.increment == 0 {
      return Err(Error::Config(
        "max_connections and increment must be at least 1".into(),
      ));
    }
    if self.min_connections > self.max_connections {
      return Err(Error::Config(
        "min_connections must not exceed max_connections".into(),
      ));
    }
    if target.is_memory() && self.min_connections == 0 {
      return Err(Error::Config(
        "an in-memory database needs min_connections >= 1".into(),
      ));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn connect_string_wins_over_path_and_memory() {
    let cfg = DatabaseConfig {
      connect_string: Some("file:a.db".into()),
      path: Some("b.db".into()),
      memory: Some("c".into()),
      ..Default::default()
    };
    assert_eq!(cfg.target().unwrap(), Target::Uri("file:a.db".into()));
  }

  #[test]
  fn path_wins_over_memory() {
    let cfg = DatabaseConfig {
      connect_string: Some("  ".into()),
      path: Some("b.db".into()),
      memory: Some("c".into()),
      ..Default::default()
    };
    assert_eq!(cfg.target().unwrap(), Target::File("b.db".into()));
  }

  #[test]
  fn no_target_is_an_error() {
    let err = DatabaseConfig::default().target().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
  }

  #[test]
  fn default_sizing() {
    let opts = PoolOptions::default();
    assert_eq!(opts.min_connections, 2);
    assert_eq!(opts.max_connections, 10);
    assert_eq!(opts.increment, 2);
    assert_eq!(opts.acquire_timeout, Duration::from_secs(60));
    assert_eq!(opts.idle_timeout, Duration::from_secs(60));
  }

  #[test]
  fn memory_location_is_a_shared_cache_uri() {
    assert_eq!(
      Target::Memory("x".into()).location(),
      "file:x?mode=memory&cache=shared"
    );
  }

  #[test]
  fn inconsistent_sizing_is_rejected() {
    let target = Target::Memory("x".into());
    let opts = PoolOptions { min_connections: 5, max_connections: 2, ..Default::default() };
    assert!(opts.check(&target).is_err());
    let opts = PoolOptions { min_connections: 0, ..Default::default() };
    assert!(opts.check(&target).is_err());
    assert!(opts.check(&Target::File("f.db".into())).is_ok());
  }
}
