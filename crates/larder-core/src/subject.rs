//! Subject — a registered account, and the acting party once it holds a
//! session.
//!
//! A missing subject (`Option<&Subject>::None`) is the guest.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Opaque, unique identifier of a subject.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
  pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for UserId {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl FromStr for UserId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self(Uuid::parse_str(s)?)) }
}

/// Privilege tier. The set is closed; there is no implied hierarchy between
/// variants.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  Chef,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Chef => "chef",
      Self::Admin => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "user" => Ok(Self::User),
      "chef" => Ok(Self::Chef),
      "admin" => Ok(Self::Admin),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

/// A registered account. Credentials never leave the store, so they are not
/// part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub id:         UserId,
  pub username:   String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::RecipeStore::add_user`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub username: String,
  pub password: String,
  #[serde(default)]
  pub role:     Role,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parses_its_own_display() {
    for role in [Role::User, Role::Chef, Role::Admin] {
      assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
    }
  }

  #[test]
  fn guest_is_not_a_role() {
    assert!(matches!("guest".parse::<Role>(), Err(Error::UnknownRole(_))));
  }

  #[test]
  fn role_serialises_lowercase() {
    assert_eq!(serde_json::to_string(&Role::Chef).unwrap(), "\"chef\"");
  }
}
