//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users` | Sorted by username |
//! | `GET`  | `/users/:id` | 404 if not found |
//! | `PUT`  | `/users/:id/role` | Body: `{"role":"chef"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use larder_core::{
  store::RecipeStore,
  subject::{Role, Subject, UserId},
};
use serde::Deserialize;

use crate::error::ApiError;

/// `GET /users`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let users = store.list_users().await.map_err(ApiError::store)?;
  Ok(Json(users))
}

/// `GET /users/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<UserId>,
) -> Result<Json<Subject>, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let user = store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role: Role,
}

/// `PUT /users/:id/role`
pub async fn set_role<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<UserId>,
  Json(body): Json<RoleBody>,
) -> Result<Json<Subject>, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let user = store
    .set_role(id, body.role)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;

  tracing::info!(user = %user.username, role = %user.role, "role changed");
  Ok(Json(user))
}
