//! Keyed-entity metadata.
//!
//! Persons, departments and ranks are all flat rows addressed by a string
//! key. Each one describes its table through a [`Schema`] and turns its
//! create/update bodies into column [`Assignment`]s. Storage backends
//! implement CRUD once over [`Entity`] instead of once per table.

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Which of the three tables an entity lives in; also supplies the wording
/// used in response messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
  Person,
  Department,
  Rank,
}

impl EntityKind {
  /// Capitalised singular, e.g. `"Department"`.
  pub fn label(self) -> &'static str {
    match self {
      Self::Person => "Person",
      Self::Department => "Department",
      Self::Rank => "Rank",
    }
  }

  pub fn singular(self) -> &'static str {
    match self {
      Self::Person => "person",
      Self::Department => "department",
      Self::Rank => "rank",
    }
  }

  pub fn plural(self) -> &'static str {
    match self {
      Self::Person => "persons",
      Self::Department => "departments",
      Self::Rank => "ranks",
    }
  }

  /// Capitalised plural, e.g. `"Ranks"`.
  pub fn plural_label(self) -> &'static str {
    match self {
      Self::Person => "Persons",
      Self::Department => "Departments",
      Self::Rank => "Ranks",
    }
  }

  /// JSON name of the primary key field.
  pub fn id_field(self) -> &'static str {
    match self {
      Self::Person => "personId",
      Self::Department => "departmentId",
      Self::Rank => "rankId",
    }
  }
}

// ─── Generated keys ──────────────────────────────────────────────────────────

/// A `<prefix><zero-padded digits>` key format, e.g. `P000000042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPattern {
  pub prefix: &'static str,
  pub digits: u32,
}

impl KeyPattern {
  /// Largest suffix that still fits in `digits` digits.
  pub fn max_suffix(&self) -> u64 { 10u64.pow(self.digits) - 1 }

  /// The numeric suffix of `key`, if it matches the pattern exactly.
  pub fn parse(&self, key: &str) -> Option<u64> {
    let digits = key.strip_prefix(self.prefix)?;
    if digits.len() != self.digits as usize
      || !digits.bytes().all(|b| b.is_ascii_digit())
    {
      return None;
    }
    digits.parse().ok()
  }

  pub fn format(&self, suffix: u64) -> String {
    format!("{}{:0width$}", self.prefix, suffix, width = self.digits as usize)
  }

  /// The key following the highest existing suffix (`None` when no key
  /// matches yet).
  pub fn next_after(&self, kind: EntityKind, max: Option<u64>) -> Result<String> {
    let next = max.map_or(1, |m| m + 1);
    if next > self.max_suffix() {
      return Err(Error::KeySpaceExhausted(kind));
    }
    Ok(self.format(next))
  }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

/// A `(table, column)` pair whose rows point at this entity's key.
#[derive(Debug, Clone, Copy)]
pub struct Reference {
  pub table:  &'static str,
  pub column: &'static str,
}

/// Table layout for a keyed entity.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
  pub table:         &'static str,
  pub key:           &'static str,
  pub name:          &'static str,
  pub active:        &'static str,
  /// Rows that must not dangle; a delete is refused while any exist.
  pub referenced_by: &'static [Reference],
  /// Set when the store may generate the key for a draft that omits it.
  pub generated_key: Option<KeyPattern>,
}

// ─── Column values ───────────────────────────────────────────────────────────

/// A backend-neutral column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
  Null,
  Text(String),
  Integer(i64),
}

impl FieldValue {
  /// Text, with the empty string treated as "no value".
  pub fn text_or_null(value: Option<String>) -> Self {
    match value {
      Some(s) if !s.is_empty() => Self::Text(s),
      _ => Self::Null,
    }
  }

  pub fn flag(value: bool) -> Self { Self::Integer(i64::from(value)) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
  pub column: &'static str,
  pub value:  FieldValue,
}

impl Assignment {
  pub fn new(column: &'static str, value: FieldValue) -> Self {
    Self { column, value }
  }
}

/// A non-key column whose value must not appear on any other row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueField {
  pub column: &'static str,
  /// Display label used in the conflict message.
  pub label:  &'static str,
  pub value:  String,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// A create body.
pub trait Draft: DeserializeOwned + Send + 'static {
  /// The caller-supplied key, if any. Blank keys count as absent.
  fn key(&self) -> Option<&str>;

  /// Required-field checks; runs before any database access.
  fn validate(&self) -> Result<()>;

  fn unique_fields(&self) -> Vec<UniqueField> { Vec::new() }

  /// Every column to insert, including the key and applied defaults.
  fn into_assignments(self, key: String) -> Result<Vec<Assignment>>;
}

/// A partial-update body. Absent fields are left untouched.
pub trait Changes: DeserializeOwned + Send + 'static {
  fn validate(&self) -> Result<()> { Ok(()) }

  fn unique_fields(&self) -> Vec<UniqueField> { Vec::new() }

  /// Only the supplied columns; empty when the body named no fields.
  fn into_assignments(self) -> Result<Vec<Assignment>>;
}

/// A row type addressable by a string key.
pub trait Entity: Serialize + Send + Sync + 'static {
  const KIND: EntityKind;
  const SCHEMA: Schema;

  type Draft: Draft;
  type Changes: Changes;

  fn key(&self) -> &str;

  /// Static records served in place of a failed listing, for entities that
  /// have them.
  fn demo_records() -> Option<Vec<Self>>
  where
    Self: Sized,
  {
    None
  }
}

/// `Some(trimmed)` when `value` holds anything besides whitespace.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
