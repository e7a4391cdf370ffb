//! Router assembly and startup tasks.

use std::sync::Arc;

use axum::{Router, routing::get};
use larder_core::{
  store::RecipeStore,
  subject::{NewUser, Role},
};
use tower_http::trace::TraceLayer;

/// The full HTTP surface: `/health` plus the JSON API under `/api`.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: RecipeStore + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", larder_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

/// Make sure the configured admin account exists. Admins cannot register
/// through the API, so this is the only way to get the first one.
pub async fn bootstrap_admin<S>(
  store: &S,
  username: &str,
  password: &str,
) -> anyhow::Result<()>
where
  S: RecipeStore,
{
  if let Some(existing) = store.get_user_by_username(username).await? {
    if existing.role != Role::Admin {
      tracing::warn!(user = %username, role = %existing.role, "bootstrap admin name is taken by a non-admin");
    }
    return Ok(());
  }

  store
    .add_user(NewUser {
      username: username.to_owned(),
      password: password.to_owned(),
      role:     Role::Admin,
    })
    .await?;
  tracing::info!(user = %username, "bootstrap admin created");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use larder_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  #[tokio::test]
  async fn bootstrap_is_idempotent() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    bootstrap_admin(&store, "skinner", "pw").await.unwrap();
    bootstrap_admin(&store, "skinner", "other").await.unwrap();

    let users = store.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].role, Role::Admin);
    assert!(store.verify_credentials("skinner", "pw").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn api_is_nested_and_health_answers() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());

    let resp = router(store.clone())
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router(store)
      .oneshot(Request::get("/api/recipes").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
