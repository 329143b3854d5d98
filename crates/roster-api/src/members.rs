//! Person-specific reads: rosters of a department or rank, and the next
//! free person ID.

use axum::{
  Json,
  extract::{Path, State},
};
use roster_core::{
  person::{Affiliation, Member},
  store::Directory,
};
use serde_json::{Value, json};

use crate::{ApiState, envelope::Envelope, error::ApiError};

async fn roster<S: Directory>(
  state: ApiState<S>,
  of: Affiliation,
  message: &str,
  context: &str,
) -> Result<Json<Envelope<Vec<Member>>>, ApiError> {
  let members = state
    .store
    .members(&of)
    .await
    .map_err(|e| state.fail(e, context))?;
  Ok(Json(Envelope::ok(members, message)))
}

/// `GET /persons/department/{dept_id}/persons`
pub async fn persons_by_department<S: Directory>(
  State(state): State<ApiState<S>>,
  Path(dept_id): Path<String>,
) -> Result<Json<Envelope<Vec<Member>>>, ApiError> {
  roster(
    state,
    Affiliation::Department(dept_id),
    "Persons by department retrieved successfully",
    "Error fetching persons by department",
  )
  .await
}

/// `GET /persons/rank/{rank_id}/persons`
pub async fn persons_by_rank<S: Directory>(
  State(state): State<ApiState<S>>,
  Path(rank_id): Path<String>,
) -> Result<Json<Envelope<Vec<Member>>>, ApiError> {
  roster(
    state,
    Affiliation::Rank(rank_id),
    "Persons by rank retrieved successfully",
    "Error fetching persons by rank",
  )
  .await
}

/// `GET /departments/{id}/persons`
pub async fn department_persons<S: Directory>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Envelope<Vec<Member>>>, ApiError> {
  roster(
    state,
    Affiliation::Department(id),
    "Department persons retrieved successfully",
    "Error fetching department persons",
  )
  .await
}

/// `GET /ranks/{id}/persons`
pub async fn rank_persons<S: Directory>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Envelope<Vec<Member>>>, ApiError> {
  roster(
    state,
    Affiliation::Rank(id),
    "Rank persons retrieved successfully",
    "Error fetching rank persons",
  )
  .await
}

/// `GET /persons/next-id/generate`
///
/// Nothing is reserved: two clients asking at once get the same ID, and the
/// second insert is refused as a duplicate.
pub async fn next_person_id<S: Directory>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Envelope<Value>>, ApiError> {
  let id = state
    .store
    .next_person_id()
    .await
    .map_err(|e| state.fail(e, "Error generating next person ID"))?;
  Ok(Json(Envelope::ok(
    json!({ "personId": id }),
    "Next person ID generated successfully",
  )))
}
