//! Startup and lifecycle errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  /// A configured CORS origin is not a usable `Origin` header value.
  #[error("invalid CORS origin {0:?}")]
  InvalidOrigin(String),

  #[error("store error: {0}")]
  Store(#[from] toolreg_store_sqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
