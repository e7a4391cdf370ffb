//! Handlers for `/auth` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/auth/register` | Body: [`RegisterBody`]; `admin` cannot self-register |
//! | `POST`   | `/auth/login` | Body: [`LoginBody`]; returns [`LoginResponse`] |
//! | `GET`    | `/auth/session` | `Authorization: Bearer <token>`; returns the subject |
//! | `DELETE` | `/auth/session` | `Authorization: Bearer <token>`; always 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use larder_core::{
  session::SessionToken,
  store::RecipeStore,
  subject::{NewUser, Role, Subject},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Pull the bearer token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<SessionToken, ApiError> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(|t| SessionToken::from(t.to_owned()))
    .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub password: String,
  /// `user` (default) or `chef`.
  pub role:     Option<Role>,
}

/// `POST /auth/register` — returns 201 + the new [`Subject`].
pub async fn register<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let username = body.username.trim().to_owned();
  if username.is_empty() || body.password.is_empty() {
    return Err(ApiError::BadRequest("username and password are required".into()));
  }
  let role = body.role.unwrap_or_default();
  if role == Role::Admin {
    return Err(ApiError::BadRequest("admin accounts cannot be self-registered".into()));
  }

  if store
    .get_user_by_username(&username)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::Conflict(format!("username {username:?} is taken")));
  }

  let subject = store
    .add_user(NewUser { username, password: body.password, role })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user = %subject.username, role = %subject.role, "registered");
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
  pub token:   SessionToken,
  pub subject: Subject,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let subject = store
    .verify_credentials(&body.username, &body.password)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::Unauthorized("invalid username or password".into()))?;

  let session = store
    .open_session(subject.id)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user = %subject.username, "logged in");
  Ok(Json(LoginResponse { token: session.token, subject }))
}

// ─── Session ──────────────────────────────────────────────────────────────────

/// `GET /auth/session` — resolve the bearer token to its subject.
pub async fn current<S>(
  State(store): State<Arc<S>>,
  headers: HeaderMap,
) -> Result<Json<Subject>, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let token = bearer_token(&headers)?;
  let subject = store
    .resolve_session(&token)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::Unauthorized("unknown session".into()))?;
  Ok(Json(subject))
}

/// `DELETE /auth/session`
pub async fn logout<S>(
  State(store): State<Arc<S>>,
  headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
  S: RecipeStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let token = bearer_token(&headers)?;
  let closed = store
    .close_session(&token)
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(closed, "logout");
  Ok(StatusCode::NO_CONTENT)
}
