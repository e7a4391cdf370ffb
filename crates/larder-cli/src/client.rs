//! Async HTTP client wrapping the Larder JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use larder_core::{
  recipe::{NewRecipe, Recipe, RecipeId, RecipePatch},
  session::{SessionToken, SubjectResolver},
  store::RecipeQuery,
  subject::{Role, Subject, UserId},
};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Body of a successful `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
  pub token:   SessionToken,
  pub subject: Subject,
}

/// Async HTTP client for the Larder JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /api/auth/register`
  pub async fn register(&self, username: &str, password: &str, role: Role) -> Result<Subject> {
    let resp = self
      .client
      .post(self.url("/auth/register"))
      .json(&json!({ "username": username, "password": password, "role": role }))
      .send()
      .await
      .context("POST /auth/register failed")?;
    expect_json(resp, "POST /auth/register").await
  }

  /// `POST /api/auth/login` — `None` on bad credentials.
  pub async fn login(&self, username: &str, password: &str) -> Result<Option<LoginResponse>> {
    let resp = self
      .client
      .post(self.url("/auth/login"))
      .json(&json!({ "username": username, "password": password }))
      .send()
      .await
      .context("POST /auth/login failed")?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      return Ok(None);
    }
    expect_json(resp, "POST /auth/login").await.map(Some)
  }

  /// `GET /api/auth/session` — `None` if the server does not know the token.
  pub async fn session(&self, token: &SessionToken) -> Result<Option<Subject>> {
    let resp = self
      .client
      .get(self.url("/auth/session"))
      .bearer_auth(token.as_str())
      .send()
      .await
      .context("GET /auth/session failed")?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      return Ok(None);
    }
    expect_json(resp, "GET /auth/session").await.map(Some)
  }

  /// `DELETE /api/auth/session`
  pub async fn logout(&self, token: &SessionToken) -> Result<()> {
    let resp = self
      .client
      .delete(self.url("/auth/session"))
      .bearer_auth(token.as_str())
      .send()
      .await
      .context("DELETE /auth/session failed")?;
    expect_success(resp, "DELETE /auth/session").await
  }

  // ── Recipes ───────────────────────────────────────────────────────────────

  /// `GET /api/recipes`
  pub async fn list_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>> {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(t) = &query.text {
      params.push(("text", t.clone()));
    }
    if let Some(c) = &query.category {
      params.push(("category", c.clone()));
    }
    if let Some(o) = query.owner_id {
      params.push(("owner_id", o.to_string()));
    }
    if let Some(l) = query.limit {
      params.push(("limit", l.to_string()));
    }
    if let Some(o) = query.offset {
      params.push(("offset", o.to_string()));
    }

    let resp = self
      .client
      .get(self.url("/recipes"))
      .query(&params)
      .send()
      .await
      .context("GET /recipes failed")?;
    expect_json(resp, "GET /recipes").await
  }

  /// `GET /api/recipes/:id` — `None` if absent.
  pub async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
    let resp = self
      .client
      .get(self.url(&format!("/recipes/{id}")))
      .send()
      .await
      .context("GET /recipes/:id failed")?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    expect_json(resp, "GET /recipes/:id").await.map(Some)
  }

  /// `POST /api/recipes`
  pub async fn create_recipe(&self, input: &NewRecipe) -> Result<Recipe> {
    let resp = self
      .client
      .post(self.url("/recipes"))
      .json(input)
      .send()
      .await
      .context("POST /recipes failed")?;
    expect_json(resp, "POST /recipes").await
  }

  /// `PUT /api/recipes/:id` — `None` if absent.
  pub async fn update_recipe(&self, id: RecipeId, patch: &RecipePatch) -> Result<Option<Recipe>> {
    let resp = self
      .client
      .put(self.url(&format!("/recipes/{id}")))
      .json(patch)
      .send()
      .await
      .context("PUT /recipes/:id failed")?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    expect_json(resp, "PUT /recipes/:id").await.map(Some)
  }

  /// `DELETE /api/recipes/:id` — `false` if absent.
  pub async fn delete_recipe(&self, id: RecipeId) -> Result<bool> {
    let resp = self
      .client
      .delete(self.url(&format!("/recipes/{id}")))
      .send()
      .await
      .context("DELETE /recipes/:id failed")?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    expect_success(resp, "DELETE /recipes/:id").await.map(|()| true)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  /// `GET /api/users`
  pub async fn list_users(&self) -> Result<Vec<Subject>> {
    let resp = self
      .client
      .get(self.url("/users"))
      .send()
      .await
      .context("GET /users failed")?;
    expect_json(resp, "GET /users").await
  }

  /// `GET /api/users/:id` — `None` if absent.
  pub async fn get_user(&self, id: UserId) -> Result<Option<Subject>> {
    let resp = self
      .client
      .get(self.url(&format!("/users/{id}")))
      .send()
      .await
      .context("GET /users/:id failed")?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    expect_json(resp, "GET /users/:id").await.map(Some)
  }

  /// `PUT /api/users/:id/role`
  pub async fn set_role(&self, id: UserId, role: Role) -> Result<Subject> {
    let resp = self
      .client
      .put(self.url(&format!("/users/{id}/role")))
      .json(&json!({ "role": role }))
      .send()
      .await
      .context("PUT /users/:id/role failed")?;
    expect_json(resp, "PUT /users/:id/role").await
  }
}

impl SubjectResolver for ApiClient {
  type Error = anyhow::Error;

  async fn resolve_subject(&self, token: &SessionToken) -> Result<Option<Subject>> {
    self.session(token).await
  }
}

// ─── Response helpers ─────────────────────────────────────────────────────────

async fn expect_success(resp: Response, what: &str) -> Result<()> {
  let status = resp.status();
  if status.is_success() {
    return Ok(());
  }
  let body = resp.text().await.unwrap_or_default();
  Err(anyhow!("{what} → {status}: {}", error_message(&body)))
}

async fn expect_json<T: serde::de::DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
  let status = resp.status();
  if !status.is_success() {
    let body = resp.text().await.unwrap_or_default();
    return Err(anyhow!("{what} → {status}: {}", error_message(&body)));
  }
  resp.json().await.with_context(|| format!("deserialising {what} response"))
}

/// The `error` field of a JSON error body, or the raw text.
fn error_message(body: &str) -> String {
  serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
    .unwrap_or_else(|| body.trim().to_owned())
}
