//! Persons: staff members, each optionally attached to one department and
//! one rank.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  credential::hash_password,
  entity::{
    Assignment, Changes, Draft, Entity, EntityKind, FieldValue, KeyPattern,
    Schema, UniqueField, present,
  },
  wire::{nullable, optional_flag},
};

/// Format of generated person keys: `P` followed by nine digits.
pub const PERSON_KEY: KeyPattern = KeyPattern { prefix: "P", digits: 9 };

// ─── Permission ──────────────────────────────────────────────────────────────

/// Access level recorded for a person. Stored only; nothing enforces it.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum SystemPermission {
  #[serde(rename = "A")]
  Admin,
  #[default]
  #[serde(rename = "U")]
  User,
}

impl SystemPermission {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "A",
      Self::User => "U",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "A" => Ok(Self::Admin),
      "U" => Ok(Self::User),
      other => Err(Error::UnknownPermission(other.to_owned())),
    }
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A person as returned by reads, with the names of the department and rank
/// it points at. The password is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
  pub person_id:       String,
  pub name:            String,
  pub username:        String,
  pub system_permis:   SystemPermission,
  pub rank_id:         Option<String>,
  pub department_id:   Option<String>,
  #[serde(with = "crate::wire::flag")]
  pub is_active:       bool,
  pub rank_name:       Option<String>,
  pub department_name: Option<String>,
}

impl Entity for Person {
  type Changes = PersonPatch;
  type Draft = NewPerson;

  const KIND: EntityKind = EntityKind::Person;
  const SCHEMA: Schema = Schema {
    table:         "persons",
    key:           "person_id",
    name:          "name",
    active:        "is_active",
    referenced_by: &[],
    generated_key: Some(PERSON_KEY),
  };

  fn key(&self) -> &str { &self.person_id }

  fn demo_records() -> Option<Vec<Self>> { Some(crate::demo::persons()) }
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Body of `POST /persons`. Every field is optional on the wire so that
/// missing ones can be reported with a single validation message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
  /// Generated by the store when absent.
  pub person_id:     Option<String>,
  pub name:          Option<String>,
  pub username:      Option<String>,
  pub password:      Option<String>,
  pub system_permis: Option<SystemPermission>,
  pub rank_id:       Option<String>,
  pub department_id: Option<String>,
  #[serde(default, deserialize_with = "optional_flag")]
  pub is_active:     Option<bool>,
}

impl Draft for NewPerson {
  fn key(&self) -> Option<&str> { present(&self.person_id) }

  fn validate(&self) -> Result<()> {
    if present(&self.name).is_none()
      || present(&self.username).is_none()
      || present(&self.password).is_none()
    {
      return Err(Error::Validation(
        "Name, username, and password are required".into(),
      ));
    }
    Ok(())
  }

  fn unique_fields(&self) -> Vec<UniqueField> {
    self
      .username
      .iter()
      .map(|username| UniqueField {
        column: "username",
        label:  "Username",
        value:  username.clone(),
      })
      .collect()
  }

  fn into_assignments(self, key: String) -> Result<Vec<Assignment>> {
    let password = self.password.unwrap_or_default();
    Ok(vec![
      Assignment::new("person_id", FieldValue::Text(key)),
      Assignment::new("name", FieldValue::Text(self.name.unwrap_or_default())),
      Assignment::new(
        "username",
        FieldValue::Text(self.username.unwrap_or_default()),
      ),
      Assignment::new("password_hash", FieldValue::Text(hash_password(&password)?)),
      Assignment::new(
        "system_permis",
        FieldValue::Text(
          self.system_permis.unwrap_or_default().as_str().to_owned(),
        ),
      ),
      Assignment::new("rank_id", FieldValue::text_or_null(self.rank_id)),
      Assignment::new(
        "department_id",
        FieldValue::text_or_null(self.department_id),
      ),
      Assignment::new("is_active", FieldValue::flag(self.is_active.unwrap_or(true))),
    ])
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Body of `PUT /persons/{id}`. `rankId`/`departmentId` may be sent as `null`
/// or `""` to detach the person.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPatch {
  pub name:          Option<String>,
  pub username:      Option<String>,
  pub password:      Option<String>,
  pub system_permis: Option<SystemPermission>,
  #[serde(default, deserialize_with = "nullable")]
  pub rank_id:       Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub department_id: Option<Option<String>>,
  #[serde(default, deserialize_with = "optional_flag")]
  pub is_active:     Option<bool>,
}

impl Changes for PersonPatch {
  fn validate(&self) -> Result<()> {
    let blank = |v: &Option<String>| v.is_some() && present(v).is_none();
    if blank(&self.name) || blank(&self.username) || blank(&self.password) {
      return Err(Error::Validation(
        "Name, username, and password cannot be empty".into(),
      ));
    }
    Ok(())
  }

  fn unique_fields(&self) -> Vec<UniqueField> {
    self
      .username
      .iter()
      .map(|username| UniqueField {
        column: "username",
        label:  "Username",
        value:  username.clone(),
      })
      .collect()
  }

  fn into_assignments(self) -> Result<Vec<Assignment>> {
    let mut set = Vec::new();
    if let Some(name) = self.name {
      set.push(Assignment::new("name", FieldValue::Text(name)));
    }
    if let Some(username) = self.username {
      set.push(Assignment::new("username", FieldValue::Text(username)));
    }
    if let Some(password) = self.password {
      set.push(Assignment::new(
        "password_hash",
        FieldValue::Text(hash_password(&password)?),
      ));
    }
    if let Some(permission) = self.system_permis {
      set.push(Assignment::new(
        "system_permis",
        FieldValue::Text(permission.as_str().to_owned()),
      ));
    }
    if let Some(rank_id) = self.rank_id {
      set.push(Assignment::new("rank_id", FieldValue::text_or_null(rank_id)));
    }
    if let Some(department_id) = self.department_id {
      set.push(Assignment::new(
        "department_id",
        FieldValue::text_or_null(department_id),
      ));
    }
    if let Some(active) = self.is_active {
      set.push(Assignment::new("is_active", FieldValue::flag(active)));
    }
    Ok(set)
  }
}

// ─── Membership listings ─────────────────────────────────────────────────────

/// Selects the persons attached to one department or one rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affiliation {
  Department(String),
  Rank(String),
}

/// A person row as shown in a department or rank roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
  pub person_id:       String,
  pub name:            String,
  pub username:        String,
  pub system_permis:   SystemPermission,
  #[serde(with = "crate::wire::flag")]
  pub is_active:       bool,
  pub rank_name:       Option<String>,
  pub department_name: Option<String>,
}
