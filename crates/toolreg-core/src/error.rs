//! Error types for `toolreg-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown {field} value: {value:?}")]
  UnknownVariant { field: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parse a closed, string-backed enumeration, naming `field` on failure.
pub(crate) fn parse_variant<T: std::str::FromStr>(
  field: &'static str,
  value: &str,
) -> Result<T> {
  value.parse().map_err(|_| Error::UnknownVariant {
    field,
    value: value.to_owned(),
  })
}
