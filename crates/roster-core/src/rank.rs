//! Ranks: job grades a person may hold.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  entity::{
    Assignment, Changes, Draft, Entity, EntityKind, FieldValue, Reference,
    Schema, present,
  },
  wire::optional_flag,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rank {
  pub rank_id:   String,
  pub name:      String,
  #[serde(with = "crate::wire::flag")]
  pub is_active: bool,
}

impl Entity for Rank {
  type Changes = RankPatch;
  type Draft = NewRank;

  const KIND: EntityKind = EntityKind::Rank;
  const SCHEMA: Schema = Schema {
    table:         "ranks",
    key:           "rank_id",
    name:          "name",
    active:        "is_active",
    referenced_by: &[Reference { table: "persons", column: "rank_id" }],
    generated_key: None,
  };

  fn key(&self) -> &str { &self.rank_id }

  fn demo_records() -> Option<Vec<Self>> { Some(crate::demo::ranks()) }
}

/// Body of `POST /ranks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRank {
  pub rank_id:   Option<String>,
  pub name:      Option<String>,
  #[serde(default, deserialize_with = "optional_flag")]
  pub is_active: Option<bool>,
}

impl Draft for NewRank {
  fn key(&self) -> Option<&str> { present(&self.rank_id) }

  fn validate(&self) -> Result<()> {
    if self.key().is_none() || present(&self.name).is_none() {
      return Err(Error::Validation("RankId and name are required".into()));
    }
    Ok(())
  }

  fn into_assignments(self, key: String) -> Result<Vec<Assignment>> {
    Ok(vec![
      Assignment::new("rank_id", FieldValue::Text(key)),
      Assignment::new("name", FieldValue::Text(self.name.unwrap_or_default())),
      Assignment::new("is_active", FieldValue::flag(self.is_active.unwrap_or(true))),
    ])
  }
}

/// Body of `PUT /ranks/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankPatch {
  pub name:      Option<String>,
  #[serde(default, deserialize_with = "optional_flag")]
  pub is_active: Option<bool>,
}

impl Changes for RankPatch {
  fn validate(&self) -> Result<()> {
    if self.name.is_some() && present(&self.name).is_none() {
      return Err(Error::Validation("Name cannot be empty".into()));
    }
    Ok(())
  }

  fn into_assignments(self) -> Result<Vec<Assignment>> {
    let mut set = Vec::new();
    if let Some(name) = self.name {
      set.push(Assignment::new("name", FieldValue::Text(name)));
    }
    if let Some(active) = self.is_active {
      set.push(Assignment::new("is_active", FieldValue::flag(active)));
    }
    Ok(set)
  }
}
