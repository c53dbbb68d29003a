//! Core types and trait definitions for the tool registry.
//!
//! Holds the three registry records (tools, bundles, policies), their
//! create/update/query shapes, and the [`store::RegistryStore`] trait that
//! storage backends implement. No HTTP or database code lives here.

pub mod bundle;
pub mod error;
pub mod policy;
pub mod store;
pub mod tool;

use chrono::{DateTime, TimeDelta, Utc};

pub use error::{Error, Result};

/// Version assigned to tools and bundles created without one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// The `updated_at` value for a row last touched at `previous` and modified
/// again at `now`.
///
/// Strictly greater than `previous`, so two updates landing on the same clock
/// tick still produce distinct timestamps.
pub fn touch(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
  let floor = previous + TimeDelta::microseconds(1);
  if now < floor { floor } else { now }
}

pub(crate) fn default_version() -> String { DEFAULT_VERSION.to_owned() }

pub(crate) fn default_true() -> bool { true }

/// Field deserializer telling an explicit `null` (`Some(None)`) apart from
/// an absent key (`None`, via `#[serde(default)]`).
pub(crate) fn nullable<'de, T, D>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
  T: serde::Deserialize<'de>,
  D: serde::Deserializer<'de>,
{
  <Option<T> as serde::Deserialize>::deserialize(de).map(Some)
}
