//! Sessions and the authentication state machine.
//!
//! ```text
//! Unresolved ──resolve──▶ Authenticated(subject)
//!      │                        │
//!      └──────resolve──▶ Anonymous ◀──logout──┘
//! ```
//!
//! A caller starts `Unresolved`, resolves the stored session reference (if
//! any) once, and only then evaluates policy. Reading the subject of an
//! `Unresolved` state is a programming error and is reported as
//! [`Error::AuthUnresolved`], never as a denial.

use std::future::Future;

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  policy::{Decision, Guard},
  subject::{Subject, UserId},
};

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// Opaque bearer token naming a server-side session.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
  /// 32 bytes from the OS RNG, hex-encoded.
  pub fn generate() -> Self {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    Self(hex::encode(bytes))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for SessionToken {
  fn from(s: String) -> Self { Self(s) }
}

// Keep tokens out of logs.
impl std::fmt::Debug for SessionToken {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("SessionToken(..)")
  }
}

/// A server-side session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub token:      SessionToken,
  pub user_id:    UserId,
  pub created_at: DateTime<Utc>,
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Anything that can turn a stored session reference into a subject: the
/// store itself on the server, an HTTP client on the other end.
pub trait SubjectResolver: Send + Sync {
  type Error: std::fmt::Display + Send;

  /// `Ok(None)` means the reference is unknown or its user is gone.
  fn resolve_subject<'a>(
    &'a self,
    token: &'a SessionToken,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;
}

/// Where a caller stands with respect to authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
  /// The session check has not finished. Policy must not be evaluated.
  #[default]
  Unresolved,
  Authenticated(Subject),
  Anonymous,
}

/// What happened to the stored session reference during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
  /// Nothing was stored.
  NoToken,
  Found,
  /// The session store answered that it does not know the token.
  Unknown,
  /// The session store could not be asked. The token may still be good.
  Failed,
}

impl AuthState {
  /// Resolve a stored session reference.
  ///
  /// No reference, an unknown reference, and a failed lookup all end in
  /// [`AuthState::Anonymous`]; the returned [`Lookup`] tells them apart so
  /// the caller can decide whether the reference is worth keeping.
  pub async fn resolve<R: SubjectResolver>(
    resolver: &R,
    token: Option<&SessionToken>,
  ) -> (Self, Lookup) {
    let Some(token) = token else {
      tracing::debug!("no stored session");
      return (Self::Anonymous, Lookup::NoToken);
    };

    match resolver.resolve_subject(token).await {
      Ok(Some(subject)) => {
        tracing::debug!(user = %subject.username, role = %subject.role, "session resolved");
        (Self::Authenticated(subject), Lookup::Found)
      }
      Ok(None) => {
        tracing::info!("stored session is no longer valid");
        (Self::Anonymous, Lookup::Unknown)
      }
      Err(e) => {
        tracing::warn!(error = %e, "session lookup failed; continuing as guest");
        (Self::Anonymous, Lookup::Failed)
      }
    }
  }

  pub fn is_resolved(&self) -> bool { !matches!(self, Self::Unresolved) }

  /// The current subject, `None` for a guest.
  pub fn subject(&self) -> Result<Option<&Subject>> {
    match self {
      Self::Unresolved => Err(Error::AuthUnresolved),
      Self::Authenticated(s) => Ok(Some(s)),
      Self::Anonymous => Ok(None),
    }
  }

  /// Evaluate `guard` against the resolved subject.
  pub fn check(&self, guard: Guard) -> Result<Decision> {
    Ok(guard.evaluate(self.subject()?))
  }

  /// Explicit logout. Has no effect on an unresolved state.
  pub fn logout(&mut self) {
    if let Self::Authenticated(_) = self {
      *self = Self::Anonymous;
    }
  }
}
