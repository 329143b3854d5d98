//! Static records for offline/demo mode.
//!
//! Served only when the server is started with `demo_fallback` enabled and a
//! person or rank listing fails.

use crate::{
  person::{Person, SystemPermission},
  rank::Rank,
};

pub fn persons() -> Vec<Person> {
  vec![
    Person {
      person_id:       "P000000001".into(),
      name:            "Alice Johnson".into(),
      username:        "ajohnson".into(),
      system_permis:   SystemPermission::Admin,
      rank_id:         Some("RANK4".into()),
      department_id:   Some("DEPT2".into()),
      is_active:       true,
      rank_name:       Some("Director".into()),
      department_name: Some("IT".into()),
    },
    Person {
      person_id:       "P000000002".into(),
      name:            "Bob Smith".into(),
      username:        "bsmith".into(),
      system_permis:   SystemPermission::User,
      rank_id:         Some("RANK3".into()),
      department_id:   Some("DEPT1".into()),
      is_active:       true,
      rank_name:       Some("Manager".into()),
      department_name: Some("Sales".into()),
    },
  ]
}

pub fn ranks() -> Vec<Rank> {
  [
    ("RANK1", "Entry Level", true),
    ("RANK2", "Senior Staff", true),
    ("RANK3", "Manager", true),
    ("RANK4", "Director", true),
    ("RANK5", "Intern", false),
  ]
  .into_iter()
  .map(|(id, name, is_active)| Rank {
    rank_id: id.into(),
    name: name.into(),
    is_active,
  })
  .collect()
}
