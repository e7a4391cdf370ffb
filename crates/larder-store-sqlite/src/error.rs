//! Error type for `larder-store-sqlite`.

use larder_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] larder_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("username already taken: {0}")]
  UsernameTaken(String),

  #[error("user not found: {0}")]
  UserNotFound(larder_core::subject::UserId),
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool { matches!(self, Self::UsernameTaken(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
