//! Server configuration, deserialised from `config.toml` and `LARDER_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use larder_core::paths::expand_tilde;
use serde::Deserialize;

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  /// Created as an admin on startup if no user by that name exists.
  pub admin_username: Option<String>,
  pub admin_password: Option<String>,
}

impl ServerConfig {
  /// Layer defaults, the optional file at `path`, then the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .set_default("store_path", "larder.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LARDER"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}
