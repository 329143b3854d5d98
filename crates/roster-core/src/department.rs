//! Departments: organisational units a person may belong to.

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
pub struct Department {
  pub department_id: String,
  pub name:          String,
  #[serde(with = "crate::wire::flag")]
  pub is_active:     bool,
}

impl Entity for Department {
  type Changes = DepartmentPatch;
  type Draft = NewDepartment;

  const KIND: EntityKind = EntityKind::Department;
  const SCHEMA: Schema = Schema {
    table:         "departments",
    key:           "department_id",
    name:          "name",
    active:        "is_active",
    referenced_by: &[Reference { table: "persons", column: "department_id" }],
    generated_key: None,
  };

  fn key(&self) -> &str { &self.department_id }
}

/// Body of `POST /departments`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDepartment {
  pub department_id: Option<String>,
  pub name:          Option<String>,
  #[serde(default, deserialize_with = "optional_flag")]
  pub is_active:     Option<bool>,
}

impl Draft for NewDepartment {
  fn key(&self) -> Option<&str> { present(&self.department_id) }

  fn validate(&self) -> Result<()> {
    if self.key().is_none() || present(&self.name).is_none() {
      return Err(Error::Validation(
        "DepartmentId and name are required".into(),
      ));
    }
    Ok(())
  }

  fn into_assignments(self, key: String) -> Result<Vec<Assignment>> {
    Ok(vec![
      Assignment::new("department_id", FieldValue::Text(key)),
      Assignment::new("name", FieldValue::Text(self.name.unwrap_or_default())),
      Assignment::new("is_active", FieldValue::flag(self.is_active.unwrap_or(true))),
    ])
  }
}

/// Body of `PUT /departments/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPatch {
  pub name:      Option<String>,
  #[serde(default, deserialize_with = "optional_flag")]
  pub is_active: Option<bool>,
}

impl Changes for DepartmentPatch {
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

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn id_and_name_are_required() {
    let d: NewDepartment = serde_json::from_str(r#"{"name":"QA"}"#).unwrap();
    assert_eq!(
      d.validate().unwrap_err().to_string(),
      "DepartmentId and name are required"
    );
  }

  #[test]
  fn blank_name_patch_is_rejected() {
    let p: DepartmentPatch = serde_json::from_str(r#"{"name":"  "}"#).unwrap();
    assert_eq!(p.validate().unwrap_err().to_string(), "Name cannot be empty");

    let p: DepartmentPatch = serde_json::from_str(r#"{"isActive":0}"#).unwrap();
    p.validate().unwrap();
  }

  #[test]
  fn name_only_patch_leaves_active_alone() {
    let p: DepartmentPatch = serde_json::from_str(r#"{"name":"X"}"#).unwrap();
    assert_eq!(p.into_assignments().unwrap(), vec![Assignment::new(
      "name",
      FieldValue::Text("X".into())
    )]);
  }
}
