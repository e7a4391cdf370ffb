//! JSON REST data service for Larder.
//!
//! Exposes an axum [`Router`] backed by any [`larder_core::store::RecipeStore`].
//! The service authenticates logins and resolves session tokens; it makes no
//! authorization decisions. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", larder_api::api_router(store.clone()))
//! ```

pub mod auth;
pub mod error;
pub mod recipes;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use larder_core::store::RecipeStore;

pub use auth::LoginResponse;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecipeStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Auth
    .route("/auth/register", post(auth::register::<S>))
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/session", get(auth::current::<S>).delete(auth::logout::<S>))
    // Recipes
    .route("/recipes", get(recipes::list::<S>).post(recipes::create::<S>))
    .route(
      "/recipes/{id}",
      get(recipes::get_one::<S>)
        .put(recipes::update_one::<S>)
        .delete(recipes::delete_one::<S>),
    )
    // Users
    .route("/users", get(users::list::<S>))
    .route("/users/{id}", get(users::get_one::<S>))
    .route("/users/{id}/role", put(users::set_role::<S>))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use larder_core::{
    recipe::Recipe,
    subject::{NewUser, Role, Subject},
  };
  use larder_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  async fn seed(store: &SqliteStore, username: &str, role: Role) -> Subject {
    store
      .add_user(NewUser {
        username: username.into(),
        password: "secret".into(),
        role,
      })
      .await
      .unwrap()
  }

  async fn send(
    store:  &Arc<SqliteStore>,
    method: &str,
    uri:    &str,
    token:  Option<&str>,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = api_router(store.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    // Extractor rejections are plain text; only JSON bodies matter here.
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_defaults_to_user_role() {
    let store = make_store().await;
    let (status, body) = send(
      &store,
      "POST",
      "/auth/register",
      None,
      Some(json!({ "username": "linguini", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "user");
    assert!(body.get("password").is_none());
  }

  #[tokio::test]
  async fn register_rejects_admin_and_duplicates() {
    let store = make_store().await;
    let (status, _) = send(
      &store,
      "POST",
      "/auth/register",
      None,
      Some(json!({ "username": "skinner", "password": "pw", "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    seed(&store, "remy", Role::Chef).await;
    let (status, body) = send(
      &store,
      "POST",
      "/auth/register",
      None,
      Some(json!({ "username": "remy", "password": "pw", "role": "chef" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("remy"));
  }

  #[tokio::test]
  async fn login_session_logout_roundtrip() {
    let store = make_store().await;
    let remy = seed(&store, "remy", Role::Chef).await;

    let (status, body) = send(
      &store,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "username": "remy", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_owned();
    assert_eq!(body["subject"]["id"], remy.id.to_string());

    let (status, body) = send(&store, "GET", "/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "remy");

    let (status, _) = send(&store, "DELETE", "/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&store, "GET", "/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn bad_credentials_and_missing_token_are_401() {
    let store = make_store().await;
    seed(&store, "remy", Role::Chef).await;

    let (status, _) = send(
      &store,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "username": "remy", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&store, "GET", "/auth/session", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  // ── Recipes ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn recipe_crud() {
    let store = make_store().await;
    let remy = seed(&store, "remy", Role::Chef).await;

    let (status, body) = send(
      &store,
      "POST",
      "/recipes",
      None,
      Some(json!({
        "owner_id": remy.id,
        "title": "Ratatouille",
        "category": "Dinner",
        "ingredients": [{ "name": "aubergine", "measure": "1" }],
        "instructions": "Slice thinly.",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Recipe = serde_json::from_value(body).unwrap();
    assert_eq!(created.owner_id, remy.id);

    let uri = format!("/recipes/{}", created.id);
    let (status, body) = send(&store, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Ratatouille");

    let (status, body) = send(
      &store,
      "PUT",
      &uri,
      None,
      Some(json!({ "title": "Confit byaldi", "owner_id": "ignored" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Confit byaldi");
    assert_eq!(body["owner_id"], remy.id.to_string());

    let (status, body) = send(&store, "GET", "/recipes?category=Dinner", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) =
      send(&store, "PUT", &uri, None, Some(json!({ "category": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], Value::Null);
    assert_eq!(body["title"], "Confit byaldi");

    let (status, _) = send(&store, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&store, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&store, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn recipe_with_unknown_owner_is_rejected() {
    let store = make_store().await;
    let (status, _) = send(
      &store,
      "POST",
      "/recipes",
      None,
      Some(json!({
        "owner_id": "00000000-0000-0000-0000-000000000001",
        "title": "Orphan soup",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn malformed_recipe_id_is_a_client_error() {
    let store = make_store().await;
    let (status, _) = send(&store, "GET", "/recipes/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Users ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn set_role_and_list_users() {
    let store = make_store().await;
    let linguini = seed(&store, "linguini", Role::User).await;
    seed(&store, "skinner", Role::Admin).await;

    let (status, body) = send(
      &store,
      "PUT",
      &format!("/users/{}/role", linguini.id),
      None,
      Some(json!({ "role": "chef" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "chef");

    let (status, body) = send(&store, "GET", "/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|u| u["username"].as_str().unwrap().to_owned())
      .collect();
    assert_eq!(names, ["linguini", "skinner"]);

    let (status, _) = send(
      &store,
      "GET",
      "/users/00000000-0000-0000-0000-000000000001",
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
