//! CRUD handlers shared by `/persons`, `/departments` and `/ranks`.
//!
//! | Method   | Path         | Notes |
//! |----------|--------------|-------|
//! | `GET`    | `/E`         | Ordered by key; may fall back to demo data |
//! | `GET`    | `/E/active`  | Ordered by name |
//! | `GET`    | `/E/{id}`    | 404 if not found |
//! | `POST`   | `/E`         | 201 with `{ <idField>: id }` |
//! | `PUT`    | `/E/{id}`    | Partial update |
//! | `DELETE` | `/E/{id}`    | 409 while persons reference the row |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
};
use roster_core::{
  Error as CoreError,
  entity::Entity,
  store::Repository,
};
use serde_json::{Map, Value};

use crate::{ApiState, envelope::Envelope, error::ApiError};

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /E`
pub async fn list<S, E>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Envelope<Vec<E>>>, ApiError>
where
  S: Repository<E>,
  E: Entity,
{
  let plural = E::KIND.plural_label();
  match state.store.list().await {
    Ok(rows) => Ok(Json(Envelope::ok(rows, format!("{plural} retrieved successfully")))),
    Err(e) => {
      let demo = state.options.demo_fallback.then(E::demo_records).flatten();
      if let Some(rows) = demo {
        tracing::warn!(error = %e, "database unavailable, serving demo {}", E::KIND.plural());
        return Ok(Json(Envelope::ok(
          rows,
          format!("{plural} retrieved successfully (from mock data - database unavailable)"),
        )));
      }
      Err(state.fail(e, format!("Error fetching {} from database", E::KIND.plural())))
    }
  }
}

/// `GET /E/active`
pub async fn list_active<S, E>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Envelope<Vec<E>>>, ApiError>
where
  S: Repository<E>,
  E: Entity,
{
  let rows = state
    .store
    .list_active()
    .await
    .map_err(|e| state.fail(e, format!("Error fetching active {}", E::KIND.plural())))?;
  Ok(Json(Envelope::ok(
    rows,
    format!("Active {} retrieved successfully", E::KIND.plural()),
  )))
}

/// `GET /E/{id}`
pub async fn get_one<S, E>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Envelope<E>>, ApiError>
where
  S: Repository<E>,
  E: Entity,
{
  let row = state
    .store
    .get(&id)
    .await
    .map_err(|e| state.fail(e, format!("Error fetching {}", E::KIND.singular())))?
    .ok_or_else(|| ApiError::not_found(CoreError::NotFound(E::KIND, id).to_string()))?;
  Ok(Json(Envelope::ok(
    row,
    format!("{} retrieved successfully", E::KIND.label()),
  )))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /E`
pub async fn create<S, E>(
  State(state): State<ApiState<S>>,
  body: Result<Json<E::Draft>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Value>>), ApiError>
where
  S: Repository<E>,
  E: Entity,
{
  let Json(draft) = body.map_err(ApiError::body)?;
  let id = state
    .store
    .create(draft)
    .await
    .map_err(|e| state.fail(e, format!("Error creating {}", E::KIND.singular())))?;

  let mut data = Map::new();
  data.insert(E::KIND.id_field().to_owned(), Value::String(id));
  Ok((
    StatusCode::CREATED,
    Json(Envelope::ok(
      Value::Object(data),
      format!("{} created successfully", E::KIND.label()),
    )),
  ))
}

/// `PUT /E/{id}`
pub async fn update<S, E>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  body: Result<Json<E::Changes>, JsonRejection>,
) -> Result<Json<Envelope<()>>, ApiError>
where
  S: Repository<E>,
  E: Entity,
{
  let Json(changes) = body.map_err(ApiError::body)?;
  state
    .store
    .update(&id, changes)
    .await
    .map_err(|e| state.fail(e, format!("Error updating {}", E::KIND.singular())))?;
  Ok(Json(Envelope::done(format!("{} updated successfully", E::KIND.label()))))
}

/// `DELETE /E/{id}`
pub async fn delete<S, E>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError>
where
  S: Repository<E>,
  E: Entity,
{
  state
    .store
    .delete(&id)
    .await
    .map_err(|e| state.fail(e, format!("Error deleting {}", E::KIND.singular())))?;
  Ok(Json(Envelope::done(format!("{} deleted successfully", E::KIND.label()))))
}
