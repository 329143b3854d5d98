//! Core types and trait definitions for the Roster personnel directory.
//!
//! No HTTP or database dependencies; every other crate builds on this one.

// Store impls use `async fn` against `impl Future + Send` trait methods.
#![allow(async_fn_in_trait)]

pub mod credential;
pub mod demo;
pub mod department;
pub mod entity;
pub mod error;
pub mod person;
pub mod rank;
pub mod store;
pub mod wire;

pub use error::{Classify, Error, ErrorKind, Result};
