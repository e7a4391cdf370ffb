//! Local persistence of the session token between invocations.

use std::{
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use larder_core::{paths::expand_tilde, session::SessionToken};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct Stored {
  token: SessionToken,
}

/// A TOML file holding at most one session token.
pub struct SessionFile {
  path: PathBuf,
}

impl SessionFile {
  pub fn new(path: impl AsRef<Path>) -> Self {
    Self { path: expand_tilde(path.as_ref()) }
  }

  pub fn path(&self) -> &Path { &self.path }

  /// The stored token, or `None` if there is no usable one.
  ///
  /// A file that does not parse is discarded with a warning. Only I/O
  /// failures are errors.
  pub fn load(&self) -> Result<Option<SessionToken>> {
    let raw = match fs::read_to_string(&self.path) {
      Ok(raw) => raw,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => {
        return Err(e).with_context(|| format!("reading {}", self.path.display()));
      }
    };
    match toml::from_str::<Stored>(&raw) {
      Ok(stored) => Ok(Some(stored.token)),
      Err(e) => {
        tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable session file");
        self.clear()?;
        Ok(None)
      }
    }
  }

  pub fn save(&self, token: &SessionToken) -> Result<()> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent)
        .with_context(|| format!("creating {}", parent.display()))?;
    }
    let raw = toml::to_string(&Stored { token: token.clone() })
      .context("serialising session")?;
    fs::write(&self.path, raw).with_context(|| format!("writing {}", self.path.display()))
  }

  pub fn clear(&self) -> Result<()> {
    match fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scratch(name: &str) -> SessionFile {
    let dir = std::env::temp_dir().join(format!("larder-cli-{}-{name}", std::process::id()));
    SessionFile::new(dir.join("session.toml"))
  }

  #[test]
  fn save_load_clear() {
    let file = scratch("roundtrip");
    assert!(file.load().unwrap().is_none());

    let token = SessionToken::generate();
    file.save(&token).unwrap();
    assert_eq!(file.load().unwrap(), Some(token));

    file.clear().unwrap();
    assert!(file.load().unwrap().is_none());
    // Clearing twice is fine.
    file.clear().unwrap();
  }

  #[test]
  fn garbage_file_is_discarded() {
    let file = scratch("garbage");
    fs::create_dir_all(file.path().parent().unwrap()).unwrap();
    fs::write(file.path(), "not = [toml").unwrap();

    assert!(file.load().unwrap().is_none());
    assert!(!file.path().exists());
  }

  #[test]
  fn unreadable_path_is_still_an_error() {
    // A directory where the file should be cannot be read as text.
    let file = scratch("is-a-dir");
    fs::create_dir_all(file.path()).unwrap();
    assert!(file.load().is_err());
    fs::remove_dir_all(file.path()).unwrap();
  }
}
