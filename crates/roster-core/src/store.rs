//! Storage traits.
//!
//! Backends (e.g. `roster-store-sqlite`) implement these; the HTTP layer
//! depends only on the traits, so tests can swap in a fake backend.

use std::future::Future;

use crate::{
  department::Department,
  entity::Entity,
  error::Classify,
  person::{Affiliation, Member, Person},
  rank::Rank,
};

/// Anything that can reach the database.
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  /// Run a trivial round trip and return the database's current time.
  fn ping(&self) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;
}

/// CRUD over one keyed entity.
///
/// Every method is a short sequence of single statements with no enclosing
/// transaction; the schema's constraints decide races between concurrent
/// writers.
pub trait Repository<E: Entity>: Backend {
  /// All rows, ordered by key.
  fn list(&self) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + '_;

  /// Rows with the active flag set, ordered by name.
  fn list_active(
    &self,
  ) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + '_;

  /// Returns `None` if no row has `id`.
  fn get<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + 'a;

  /// Validate and insert a new row, returning its key.
  ///
  /// Fails with a validation error for missing fields, and a conflict when
  /// the key or a unique field is already taken.
  fn create(
    &self,
    draft: E::Draft,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  /// Apply a partial update. Fails with not-found, a unique-field conflict,
  /// or a validation error when `changes` names no fields.
  fn update<'a>(
    &'a self,
    id: &'a str,
    changes: E::Changes,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete a row. Refused while any row in `E::SCHEMA.referenced_by`
  /// still points at it.
  fn delete<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// The full personnel directory: all three repositories plus the
/// person-specific reads.
pub trait Directory:
  Backend + Repository<Person> + Repository<Department> + Repository<Rank>
{
  /// The next unused `P<9 digits>` key. Nothing is reserved; two callers
  /// may receive the same value.
  fn next_person_id(
    &self,
  ) -> impl Future<Output = Result<String, <Self as Backend>::Error>> + Send + '_;

  /// Persons attached to a department or rank, ordered by name.
  fn members<'a>(
    &'a self,
    of: &'a Affiliation,
  ) -> impl Future<Output = Result<Vec<Member>, <Self as Backend>::Error>> + Send + 'a;
}
