//! Mapping between domain types and SQLite rows.
//!
//! Row closures run on the connection's worker thread and only pull raw
//! column values; decoding into domain types (which can fail) happens back
//! on the async side, the same split for every entity.

use roster_core::{
  department::Department,
  entity::{Entity, FieldValue},
  person::{Member, Person, SystemPermission},
  rank::Rank,
};
use rusqlite::{Row, types::Value};

use crate::Result;

// ─── Column values ───────────────────────────────────────────────────────────

pub fn encode_value(value: FieldValue) -> Value {
  match value {
    FieldValue::Null => Value::Null,
    FieldValue::Text(s) => Value::Text(s),
    FieldValue::Integer(i) => Value::Integer(i),
  }
}

pub fn decode_flag(raw: i64) -> bool { raw != 0 }

// ─── Record ──────────────────────────────────────────────────────────────────

/// An [`Entity`] this store knows how to read back.
pub trait Record: Entity + Sized {
  /// `SELECT ... FROM <table> t [JOIN ...]`, with the entity's own table
  /// aliased `t` so filters can be appended.
  const SELECT: &'static str;

  type Raw: Send + 'static;

  fn read(row: &Row<'_>) -> rusqlite::Result<Self::Raw>;

  fn decode(raw: Self::Raw) -> Result<Self>;
}

// ─── Person ──────────────────────────────────────────────────────────────────

pub struct RawPerson {
  person_id:       String,
  name:            String,
  username:        String,
  system_permis:   String,
  rank_id:         Option<String>,
  department_id:   Option<String>,
  is_active:       i64,
  rank_name:       Option<String>,
  department_name: Option<String>,
}

impl Record for Person {
  type Raw = RawPerson;

  const SELECT: &'static str = "SELECT t.person_id, t.name, t.username, \
     t.system_permis, t.rank_id, t.department_id, t.is_active, r.name, d.name \
     FROM persons t \
     LEFT JOIN ranks r ON r.rank_id = t.rank_id \
     LEFT JOIN departments d ON d.department_id = t.department_id";

  fn read(row: &Row<'_>) -> rusqlite::Result<RawPerson> {
    Ok(RawPerson {
      person_id:       row.get(0)?,
      name:            row.get(1)?,
      username:        row.get(2)?,
      system_permis:   row.get(3)?,
      rank_id:         row.get(4)?,
      department_id:   row.get(5)?,
      is_active:       row.get(6)?,
      rank_name:       row.get(7)?,
      department_name: row.get(8)?,
    })
  }

  fn decode(raw: RawPerson) -> Result<Self> {
    Ok(Person {
      system_permis:   SystemPermission::parse(&raw.system_permis)?,
      is_active:       decode_flag(raw.is_active),
      person_id:       raw.person_id,
      name:            raw.name,
      username:        raw.username,
      rank_id:         raw.rank_id,
      department_id:   raw.department_id,
      rank_name:       raw.rank_name,
      department_name: raw.department_name,
    })
  }
}

// ─── Department / Rank ───────────────────────────────────────────────────────

impl Record for Department {
  type Raw = (String, String, i64);

  const SELECT: &'static str =
    "SELECT t.department_id, t.name, t.is_active FROM departments t";

  fn read(row: &Row<'_>) -> rusqlite::Result<Self::Raw> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
  }

  fn decode((department_id, name, active): Self::Raw) -> Result<Self> {
    Ok(Department { department_id, name, is_active: decode_flag(active) })
  }
}

impl Record for Rank {
  type Raw = (String, String, i64);

  const SELECT: &'static str =
    "SELECT t.rank_id, t.name, t.is_active FROM ranks t";

  fn read(row: &Row<'_>) -> rusqlite::Result<Self::Raw> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
  }

  fn decode((rank_id, name, active): Self::Raw) -> Result<Self> {
    Ok(Rank { rank_id, name, is_active: decode_flag(active) })
  }
}

// ─── Member ──────────────────────────────────────────────────────────────────

pub const MEMBER_SELECT: &str = "SELECT t.person_id, t.name, t.username, \
   t.system_permis, t.is_active, r.name, d.name \
   FROM persons t \
   LEFT JOIN ranks r ON r.rank_id = t.rank_id \
   LEFT JOIN departments d ON d.department_id = t.department_id";

pub struct RawMember {
  person_id:       String,
  name:            String,
  username:        String,
  system_permis:   String,
  is_active:       i64,
  rank_name:       Option<String>,
  department_name: Option<String>,
}

impl RawMember {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:       row.get(0)?,
      name:            row.get(1)?,
      username:        row.get(2)?,
      system_permis:   row.get(3)?,
      is_active:       row.get(4)?,
      rank_name:       row.get(5)?,
      department_name: row.get(6)?,
    })
  }

  pub fn into_member(self) -> Result<Member> {
    Ok(Member {
      system_permis:   SystemPermission::parse(&self.system_permis)?,
      is_active:       decode_flag(self.is_active),
      person_id:       self.person_id,
      name:            self.name,
      username:        self.username,
      rank_name:       self.rank_name,
      department_name: self.department_name,
    })
  }
}
