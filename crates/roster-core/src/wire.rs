//! Serde helpers for the JSON wire format.

use std::fmt;

use serde::{
  Deserialize, Deserializer, Serializer,
  de::{self, Unexpected, Visitor},
};

/// An `isActive`-style flag: written as `0`/`1`, read from `0`/`1`,
/// `true`/`false` or their string forms.
struct Flag(bool);

struct FlagVisitor;

impl Visitor<'_> for FlagVisitor {
  type Value = Flag;

  fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str("0 or 1")
  }

  fn visit_bool<E: de::Error>(self, v: bool) -> Result<Flag, E> { Ok(Flag(v)) }

  fn visit_u64<E: de::Error>(self, v: u64) -> Result<Flag, E> {
    match v {
      0 => Ok(Flag(false)),
      1 => Ok(Flag(true)),
      _ => Err(E::invalid_value(Unexpected::Unsigned(v), &self)),
    }
  }

  fn visit_i64<E: de::Error>(self, v: i64) -> Result<Flag, E> {
    match v {
      0 => Ok(Flag(false)),
      1 => Ok(Flag(true)),
      _ => Err(E::invalid_value(Unexpected::Signed(v), &self)),
    }
  }

  fn visit_str<E: de::Error>(self, v: &str) -> Result<Flag, E> {
    match v {
      "0" | "false" => Ok(Flag(false)),
      "1" | "true" => Ok(Flag(true)),
      _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
    }
  }
}

impl<'de> Deserialize<'de> for Flag {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    d.deserialize_any(FlagVisitor)
  }
}

/// `#[serde(with = "crate::wire::flag")]` for `bool` fields.
pub mod flag {
  use super::*;

  pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u8(u8::from(*value))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Flag::deserialize(d).map(|f| f.0)
  }
}

/// For `Option<bool>` flags in request bodies; pair with `#[serde(default)]`.
pub fn optional_flag<'de, D: Deserializer<'de>>(
  d: D,
) -> Result<Option<bool>, D::Error> {
  Option::<Flag>::deserialize(d).map(|f| f.map(|f| f.0))
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`); pair with `#[serde(default)]`.
pub fn nullable<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(d).map(Some)
}
