//! Error types for `larder-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The authentication state was read before the session check finished.
  /// This is a caller bug, not a denial.
  #[error("authentication state is not resolved yet")]
  AuthUnresolved,

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("invalid identifier: {0}")]
  InvalidId(#[from] uuid::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
