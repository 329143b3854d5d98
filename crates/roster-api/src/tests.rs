//! Router tests against an in-memory SQLite store and a store whose database
//! is always down.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use roster_core::{
  Classify, ErrorKind,
  entity::Entity,
  person::{Affiliation, Member},
  store::{Backend, Directory, Repository},
};
use roster_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiOptions, api_router};

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  api_router(Arc::new(store), ApiOptions::default())
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(json) => builder
      .header("content-type", "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, json)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
  send(app, "POST", uri, Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
  send(app, "GET", uri, None).await
}

fn person(name: &str, username: &str) -> Value {
  json!({ "name": name, "username": username, "password": "secret" })
}

// ─── Persons ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_list_is_success() {
  let app = app().await;
  let (status, body) = get(&app, "/persons").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({
    "success": true,
    "data": [],
    "message": "Persons retrieved successfully",
  }));
}

#[tokio::test]
async fn create_then_read_applies_defaults() {
  let app = app().await;
  let (status, body) = post(&app, "/persons", person("Ann Lee", "alee")).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["message"], "Person created successfully");
  assert_eq!(body["data"], json!({ "personId": "P000000001" }));

  let (status, body) = get(&app, "/persons/P000000001").await;
  assert_eq!(status, StatusCode::OK);
  let data = &body["data"];
  assert_eq!(data["name"], "Ann Lee");
  assert_eq!(data["isActive"], 1);
  assert_eq!(data["systemPermis"], "U");
  assert_eq!(data["rankId"], Value::Null);
  assert!(data.get("password").is_none());
  assert!(data.get("passwordHash").is_none());
}

#[tokio::test]
async fn get_is_idempotent() {
  let app = app().await;
  post(&app, "/persons", person("Ann Lee", "alee")).await;
  let first = get(&app, "/persons/P000000001").await;
  let second = get(&app, "/persons/P000000001").await;
  assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_person_is_404() {
  let app = app().await;
  let (status, body) = get(&app, "/persons/P000000404").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body, json!({ "success": false, "message": "Person not found" }));
}

#[tokio::test]
async fn missing_password_is_400() {
  let app = app().await;
  let (status, body) =
    post(&app, "/persons", json!({ "name": "Ann", "username": "ann" })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "Name, username, and password are required");
}

#[tokio::test]
async fn duplicate_username_is_409_on_insert_and_update() {
  let app = app().await;
  post(&app, "/persons", person("Ann Lee", "alee")).await;
  post(&app, "/persons", person("Bob Ray", "bray")).await;

  let (status, body) = post(&app, "/persons", person("Al Lee", "alee")).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["success"], false);
  assert_eq!(body["message"], "Username already exists");

  let (status, body) = send(
    &app,
    "PUT",
    "/persons/P000000002",
    Some(json!({ "username": "alee" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() {
  let app = app().await;
  post(&app, "/persons", person("Ann Lee", "alee")).await;

  let (status, body) = send(
    &app,
    "PUT",
    "/persons/P000000001",
    Some(json!({ "isActive": "0", "systemPermis": "A" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Person updated successfully");

  let (_, body) = get(&app, "/persons/P000000001").await;
  assert_eq!(body["data"]["isActive"], 0);
  assert_eq!(body["data"]["systemPermis"], "A");
  assert_eq!(body["data"]["name"], "Ann Lee");
}

#[tokio::test]
async fn empty_update_is_400() {
  let app = app().await;
  post(&app, "/persons", person("Ann Lee", "alee")).await;
  let (status, body) = send(&app, "PUT", "/persons/P000000001", Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "No fields to update");

  let (status, _) =
    send(&app, "PUT", "/persons/P000000009", Some(json!({ "name": "X" }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_bodies_are_400() {
  let app = app().await;

  let req = Request::builder()
    .method("POST")
    .uri("/persons")
    .header("content-type", "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body["message"], "Invalid request body");
  assert!(body["error"].is_string());

  let mut bad_flag = person("Ann Lee", "alee");
  bad_flag["isActive"] = json!("yes");
  let (status, body) = post(&app, "/persons", bad_flag).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "Invalid request body");
}

#[tokio::test]
async fn next_id_follows_highest_suffix() {
  let app = app().await;
  let (_, body) = get(&app, "/persons/next-id/generate").await;
  assert_eq!(body["data"]["personId"], "P000000001");

  for n in 1..=5 {
    post(&app, "/persons", person("Someone", &format!("user{n}"))).await;
  }
  let (status, body) = get(&app, "/persons/next-id/generate").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Next person ID generated successfully");
  assert_eq!(body["data"]["personId"], "P000000006");
}

#[tokio::test]
async fn active_persons_are_ordered_by_name() {
  let app = app().await;
  post(&app, "/persons", person("Zoe Park", "zpark")).await;
  post(&app, "/persons", person("Ann Lee", "alee")).await;
  let mut inactive = person("Bob Ray", "bray");
  inactive["isActive"] = json!(0);
  post(&app, "/persons", inactive).await;

  let (_, body) = get(&app, "/persons/active").await;
  assert_eq!(body["message"], "Active persons retrieved successfully");
  let names: Vec<_> = body["data"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["name"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(names, ["Ann Lee", "Zoe Park"]);
}

// ─── Departments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn department_lifecycle_with_blocked_delete() {
  let app = app().await;

  let (status, body) =
    post(&app, "/departments", json!({ "departmentId": "DEPT1", "name": "Sales" })).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"], json!({ "departmentId": "DEPT1" }));

  let (status, body) = get(&app, "/departments/DEPT1").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"], json!({ "departmentId": "DEPT1", "name": "Sales", "isActive": 1 }));

  let (status, body) =
    post(&app, "/departments", json!({ "departmentId": "DEPT1", "name": "Again" })).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["message"], "Department ID already exists");

  let mut member = person("Ann Lee", "alee");
  member["departmentId"] = json!("DEPT1");
  post(&app, "/persons", member).await;

  let (status, body) = send(&app, "DELETE", "/departments/DEPT1", None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(
    body["message"],
    "Cannot delete department. It is being used by one or more persons."
  );

  let (status, _) = send(&app, "DELETE", "/persons/P000000001", None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, body) = send(&app, "DELETE", "/departments/DEPT1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Department deleted successfully");

  let (status, body) = get(&app, "/departments/DEPT1").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Department not found");
}

#[tokio::test]
async fn department_requires_id_and_name() {
  let app = app().await;
  let (status, body) = post(&app, "/departments", json!({ "name": "Sales" })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "DepartmentId and name are required");
}

#[tokio::test]
async fn renaming_a_department_keeps_it_inactive() {
  let app = app().await;
  post(
    &app,
    "/departments",
    json!({ "departmentId": "D1", "name": "Sales", "isActive": 0 }),
  )
  .await;

  let (status, body) =
    send(&app, "PUT", "/departments/D1", Some(json!({ "name": "X" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Department updated successfully");

  let (_, body) = get(&app, "/departments/D1").await;
  assert_eq!(body["data"], json!({ "departmentId": "D1", "name": "X", "isActive": 0 }));
}

#[tokio::test]
async fn blank_department_name_is_400_on_update() {
  let app = app().await;
  post(&app, "/departments", json!({ "departmentId": "D1", "name": "Sales" })).await;

  let (status, body) =
    send(&app, "PUT", "/departments/D1", Some(json!({ "name": "" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["message"], "Name cannot be empty");

  let (_, body) = get(&app, "/departments/D1").await;
  assert_eq!(body["data"]["name"], "Sales");
}

#[tokio::test]
async fn unknown_department_reference_is_400() {
  let app = app().await;
  let mut body = person("Ann Lee", "alee");
  body["departmentId"] = json!("NOPE");
  let (status, _) = post(&app, "/persons", body).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Rosters ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rosters_list_members_by_name() {
  let app = app().await;
  post(&app, "/departments", json!({ "departmentId": "DEPT1", "name": "Sales" })).await;
  post(&app, "/ranks", json!({ "rankId": "RANK3", "name": "Manager" })).await;
  for (name, username) in [("Zoe Park", "zpark"), ("Ann Lee", "alee")] {
    let mut body = person(name, username);
    body["departmentId"] = json!("DEPT1");
    body["rankId"] = json!("RANK3");
    post(&app, "/persons", body).await;
  }

  let (status, body) = get(&app, "/persons/department/DEPT1/persons").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Persons by department retrieved successfully");
  assert_eq!(body["data"][0]["name"], "Ann Lee");
  assert_eq!(body["data"][0]["rankName"], "Manager");
  assert_eq!(body["data"][1]["name"], "Zoe Park");

  let (_, body) = get(&app, "/ranks/RANK3/persons").await;
  assert_eq!(body["message"], "Rank persons retrieved successfully");
  assert_eq!(body["data"][0]["departmentName"], "Sales");

  let (_, body) = get(&app, "/departments/DEPT1/persons").await;
  assert_eq!(body["data"].as_array().unwrap().len(), 2);

  let (_, body) = get(&app, "/persons/rank/RANK9/persons").await;
  assert_eq!(body["data"], json!([]));
}

// ─── Methods ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn wrong_method_gets_an_envelope() {
  let app = app().await;
  let (status, body) = send(&app, "PATCH", "/persons", None).await;
  assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
  assert_eq!(body, json!({ "success": false, "message": "Method not allowed" }));
}

// ─── Connectivity ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connection_reports_time() {
  let app = app().await;
  let (status, body) = get(&app, "/test-connection").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["status"], "Connected");
  assert!(body["data"]["currentTime"].is_string());
}

// ─── Database down ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("database is down")]
struct Down;

impl Classify for Down {
  fn kind(&self) -> ErrorKind { ErrorKind::Internal }
}

struct DownStore;

impl Backend for DownStore {
  type Error = Down;

  async fn ping(&self) -> Result<String, Down> { Err(Down) }
}

impl<E: Entity> Repository<E> for DownStore {
  async fn list(&self) -> Result<Vec<E>, Down> { Err(Down) }

  async fn list_active(&self) -> Result<Vec<E>, Down> { Err(Down) }

  async fn get(&self, _id: &str) -> Result<Option<E>, Down> { Err(Down) }

  async fn create(&self, _draft: E::Draft) -> Result<String, Down> { Err(Down) }

  async fn update(&self, _id: &str, _changes: E::Changes) -> Result<(), Down> {
    Err(Down)
  }

  async fn delete(&self, _id: &str) -> Result<(), Down> { Err(Down) }
}

impl Directory for DownStore {
  async fn next_person_id(&self) -> Result<String, Down> { Err(Down) }

  async fn members(&self, _of: &Affiliation) -> Result<Vec<Member>, Down> {
    Err(Down)
  }
}

fn down(options: ApiOptions) -> Router { api_router(Arc::new(DownStore), options) }

#[tokio::test]
async fn demo_fallback_serves_persons_and_ranks_only() {
  let app = down(ApiOptions { demo_fallback: true, ..Default::default() });

  let (status, body) = get(&app, "/persons").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body["message"],
    "Persons retrieved successfully (from mock data - database unavailable)"
  );
  assert_eq!(body["data"].as_array().unwrap().len(), 2);

  let (status, body) = get(&app, "/ranks").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"].as_array().unwrap().len(), 5);

  let (status, body) = get(&app, "/departments").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["message"], "Error fetching departments from database");
  assert_eq!(body["error"], "database is down");
}

#[tokio::test]
async fn without_fallback_listing_fails() {
  let app = down(ApiOptions::default());
  let (status, body) = get(&app, "/persons").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["success"], false);
  assert_eq!(body["message"], "Error fetching persons from database");
}

#[tokio::test]
async fn hidden_errors_omit_detail() {
  let app = down(ApiOptions { expose_errors: false, ..Default::default() });
  let (status, body) =
    post(&app, "/ranks", json!({ "rankId": "RANK1", "name": "Entry Level" })).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body, json!({ "success": false, "message": "Error creating rank" }));
}

#[tokio::test]
async fn failed_ping_is_500() {
  let app = down(ApiOptions::default());
  let (status, body) = get(&app, "/test-connection").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["message"], "Database connection failed");
}
