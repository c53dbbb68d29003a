//! Error type for `toolreg-store-sqlite`.

use thiserror::Error;
use toolreg_core::store::{ErrorKind, StoreError};

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] toolreg_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("tool not found: {0}")]
  ToolNotFound(i64),

  #[error("bundle not found: {0}")]
  BundleNotFound(i64),

  #[error("policy not found: {0}")]
  PolicyNotFound(i64),

  /// Insert or rename collided with an existing row's unique name.
  #[error("{entity} named {name:?} already exists")]
  DuplicateName { entity: &'static str, name: String },

  /// A policy referenced a bundle id that is not in the store.
  #[error("policy references unknown bundle {0}")]
  UnknownBundle(i64),
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::ToolNotFound(_) | Error::BundleNotFound(_) | Error::PolicyNotFound(_) => {
        ErrorKind::NotFound
      }
      Error::DuplicateName { .. } => ErrorKind::Conflict,
      Error::UnknownBundle(_) => ErrorKind::Invalid,
      Error::Core(_) | Error::Database(_) | Error::Json(_) | Error::DateParse(_) => {
        ErrorKind::Internal
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
