//! Runtime settings, read from environment variables and an optional env
//! file.
//!
//! Every field has a default, so an empty environment yields a working
//! development configuration. Variable names are the upper-case field names
//! (`POSTGRES_PORT`, `CORS_ORIGINS`, ...) and are case-sensitive. String
//! values are taken verbatim. `CORS_ORIGINS` is a comma-separated list.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use config::{Config, Environment};
use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// Immutable process-wide settings; build once at startup.
///
/// The registry persists to the SQLite file at `store_path`. The `postgres_*`
/// fields only feed [`Settings::database_url`] and
/// [`Settings::sync_database_url`] and the startup log; nothing connects to
/// Postgres.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub postgres_user:     String,
  pub postgres_password: String,
  pub postgres_db:       String,
  pub postgres_host:     String,
  pub postgres_port:     u16,

  pub app_name:    String,
  pub app_version: String,
  pub app_env:     String,
  pub debug:       bool,

  #[serde(deserialize_with = "comma_list")]
  pub cors_origins: Vec<String>,

  /// File backing the SQLite store.
  pub store_path: PathBuf,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      postgres_user:     "toolregistry".to_string(),
      postgres_password: "devpassword".to_string(),
      postgres_db:       "toolregistry_db".to_string(),
      postgres_host:     "localhost".to_string(),
      postgres_port:     5432,
      app_name:          "Tool Registry API".to_string(),
      app_version:       "1.0.0".to_string(),
      app_env:           "development".to_string(),
      debug:             true,
      cors_origins:      vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
      ],
      store_path:        PathBuf::from("toolregistry.db"),
    }
  }
}

impl Settings {
  /// Load `env_file` into the process environment (when it exists; values
  /// already set in the environment win), then read settings from the
  /// environment.
  pub fn load(env_file: Option<&Path>) -> Result<Self> {
    if let Some(path) = env_file {
      match dotenvy::from_path(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "loaded env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(path = %path.display(), "ignoring env file: {e}"),
      }
    }
    Self::from_vars(std::env::vars())
  }

  /// Read settings from an explicit set of `(NAME, value)` pairs.
  pub fn from_vars<I>(vars: I) -> Result<Self>
  where
    I: IntoIterator<Item = (String, String)>,
  {
    // `config` lowercases keys, so drop anything not spelled in upper case
    // before it can alias a setting.
    let vars: HashMap<String, String> = vars
      .into_iter()
      .filter(|(name, _)| !name.chars().any(|c| c.is_ascii_lowercase()))
      .collect();
    let settings = Config::builder()
      .add_source(Environment::default().source(Some(vars)))
      .build()?
      .try_deserialize()?;
    Ok(settings)
  }

  /// Connection URL for the asynchronous Postgres driver.
  pub fn database_url(&self) -> String {
    format!("postgresql+asyncpg://{}", self.url_tail())
  }

  /// Connection URL for synchronous tooling such as migrations.
  pub fn sync_database_url(&self) -> String {
    format!("postgresql://{}", self.url_tail())
  }

  fn url_tail(&self) -> String {
    format!(
      "{}:{}@{}:{}/{}",
      self.postgres_user,
      self.postgres_password,
      self.postgres_host,
      self.postgres_port,
      self.postgres_db
    )
  }
}

/// `"a, b,,c"` → `["a", "b", "c"]`.
fn comma_list<'de, D>(de: D) -> std::result::Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(de)?;
  Ok(
    raw
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned)
      .collect(),
  )
}
