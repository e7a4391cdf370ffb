//! Handlers for `/recipes` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/recipes` | Optional `text`, `category`, `owner_id`, `limit`, `offset` |
//! | `POST`   | `/recipes` | Body: [`NewRecipe`]; returns 201 + stored recipe |
//! | `GET`    | `/recipes/:id` | 404 if not found |
//! | `PUT`    | `/recipes/:id` | Body: [`RecipePatch`]; the owner never changes |
//! | `DELETE` | `/recipes/:id` | 204, or 404 if not found |
//!
//! This service stores and serves data only. Whether the caller may create,
//! edit, or delete is decided client-side through `larder_core::policy`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use larder_core::{
  recipe::{NewRecipe, Recipe, RecipeId, RecipePatch},
  store::{RecipeQuery, RecipeStore},
  subject::UserId,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub text:     Option<String>,
  pub category: Option<String>,
  pub owner_id: Option<UserId>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

/// `GET /recipes[?text=...][&category=...][&owner_id=...][&limit=...][&offset=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Recipe>>, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = RecipeQuery {
    text:     params.text.filter(|t| !t.is_empty()),
    category: params.category.filter(|c| !c.is_empty()),
    owner_id: params.owner_id,
    limit:    params.limit,
    offset:   params.offset,
  };

  let recipes = store
    .list_recipes(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(recipes))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /recipes` — returns 201 + the stored [`Recipe`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewRecipe>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.title.trim().is_empty() {
    return Err(ApiError::BadRequest("title is required".into()));
  }
  let owner = body.owner_id;
  if store
    .get_user(owner)
    .await
    .map_err(ApiError::store)?
    .is_none()
  {
    return Err(ApiError::BadRequest(format!("owner {owner} does not exist")));
  }

  let recipe = store
    .add_recipe(body)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(recipe = %recipe.id, owner = %recipe.owner_id, "recipe created");
  Ok((StatusCode::CREATED, Json(recipe)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /recipes/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<RecipeId>,
) -> Result<Json<Recipe>, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let recipe = store
    .get_recipe(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("recipe {id} not found")))?;
  Ok(Json(recipe))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /recipes/:id` — body is a [`RecipePatch`].
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<RecipeId>,
  Json(patch): Json<RecipePatch>,
) -> Result<Json<Recipe>, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
    return Err(ApiError::BadRequest("title cannot be blank".into()));
  }

  let recipe = store
    .update_recipe(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("recipe {id} not found")))?;

  tracing::info!(recipe = %recipe.id, "recipe updated");
  Ok(Json(recipe))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /recipes/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<RecipeId>,
) -> Result<StatusCode, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let removed = store
    .delete_recipe(id)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!("recipe {id} not found")));
  }

  tracing::info!(recipe = %id, "recipe deleted");
  Ok(StatusCode::NO_CONTENT)
}
