//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use larder_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a backend error. Conflicts keep their meaning as a 409.
  pub(crate) fn store<E: StoreError>(e: E) -> Self {
    if e.is_conflict() {
      return Self::Conflict(e.to_string());
    }
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use larder_core::subject::UserId;

  use super::*;

  #[test]
  fn store_conflicts_become_409() {
    let taken = ApiError::store(larder_store_sqlite::Error::UsernameTaken("remy".into()));
    assert!(matches!(taken, ApiError::Conflict(_)));
    assert_eq!(taken.into_response().status(), StatusCode::CONFLICT);

    let missing = ApiError::store(larder_store_sqlite::Error::UserNotFound(UserId::new()));
    assert_eq!(missing.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
