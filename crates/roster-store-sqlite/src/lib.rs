//! SQLite backend for the Roster personnel directory.
//!
//! Wraps [`tokio_rusqlite`] in a small connection pool so database work runs
//! on dedicated threads without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod config;
pub mod error;
pub mod pool;

pub use config::DatabaseConfig;
pub use error::{Error, Result};
pub use store::SqliteStore;
