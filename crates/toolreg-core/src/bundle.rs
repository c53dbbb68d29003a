//! Bundle types: a named, versioned grouping of tools.
//!
//! Membership of tools in a bundle is not materialised yet; a bundle only
//! carries its own metadata, publication state and the policies that point
//! at it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{default_true, default_version, touch};

/// A bundle as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Bundle {
  pub id:                i64,
  pub name:              String,
  pub display_name:      String,
  pub description:       String,
  pub version:           String,
  pub author:            Option<String>,
  pub category:          Option<String>,
  pub tags:              Option<Vec<String>>,
  pub icon_url:          Option<String>,
  pub documentation_url: Option<String>,
  pub repository_url:    Option<String>,
  pub is_public:         bool,
  pub is_published:      bool,
  pub download_count:    i64,
  pub star_count:        i64,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
  /// Set while the bundle is published; cleared when it is withdrawn.
  pub published_at:      Option<DateTime<Utc>>,
}

/// Input to [`crate::store::RegistryStore::create_bundle`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewBundle {
  pub name:              String,
  pub display_name:      String,
  pub description:       String,
  #[serde(default = "default_version")]
  pub version:           String,
  #[serde(default)]
  pub author:            Option<String>,
  #[serde(default)]
  pub category:          Option<String>,
  #[serde(default)]
  pub tags:              Option<Vec<String>>,
  #[serde(default)]
  pub icon_url:          Option<String>,
  #[serde(default)]
  pub documentation_url: Option<String>,
  #[serde(default)]
  pub repository_url:    Option<String>,
  #[serde(default = "default_true")]
  pub is_public:         bool,
  #[serde(default)]
  pub is_published:      bool,
}

impl NewBundle {
  pub fn new(
    name: impl Into<String>,
    display_name: impl Into<String>,
    description: impl Into<String>,
  ) -> Self {
    Self {
      name: name.into(),
      display_name: display_name.into(),
      description: description.into(),
      version: default_version(),
      author: None,
      category: None,
      tags: None,
      icon_url: None,
      documentation_url: None,
      repository_url: None,
      is_public: true,
      is_published: false,
    }
  }

  /// Materialise the row the store will insert.
  pub fn into_bundle(self, id: i64, now: DateTime<Utc>) -> Bundle {
    Bundle {
      id,
      name: self.name,
      display_name: self.display_name,
      description: self.description,
      version: self.version,
      author: self.author,
      category: self.category,
      tags: self.tags,
      icon_url: self.icon_url,
      documentation_url: self.documentation_url,
      repository_url: self.repository_url,
      is_public: self.is_public,
      is_published: self.is_published,
      download_count: 0,
      star_count: 0,
      created_at: now,
      updated_at: now,
      published_at: self.is_published.then_some(now),
    }
  }
}

/// Partial update for a bundle. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct BundleUpdate {
  pub name:              Option<String>,
  pub display_name:      Option<String>,
  pub description:       Option<String>,
  pub version:           Option<String>,
  pub author:            Option<String>,
  pub category:          Option<String>,
  pub tags:              Option<Vec<String>>,
  pub icon_url:          Option<String>,
  pub documentation_url: Option<String>,
  pub repository_url:    Option<String>,
  pub is_public:         Option<bool>,
  pub is_published:      Option<bool>,
}

impl BundleUpdate {
  /// Apply the patch to `bundle`, refreshing `updated_at` and tracking
  /// `published_at` across publication changes.
  pub fn apply(self, bundle: &mut Bundle, now: DateTime<Utc>) {
    if let Some(v) = self.name { bundle.name = v; }
    if let Some(v) = self.display_name { bundle.display_name = v; }
    if let Some(v) = self.description { bundle.description = v; }
    if let Some(v) = self.version { bundle.version = v; }
    if let Some(v) = self.author { bundle.author = Some(v); }
    if let Some(v) = self.category { bundle.category = Some(v); }
    if let Some(v) = self.tags { bundle.tags = Some(v); }
    if let Some(v) = self.icon_url { bundle.icon_url = Some(v); }
    if let Some(v) = self.documentation_url { bundle.documentation_url = Some(v); }
    if let Some(v) = self.repository_url { bundle.repository_url = Some(v); }
    if let Some(v) = self.is_public { bundle.is_public = v; }

    let updated_at = touch(bundle.updated_at, now);
    match self.is_published {
      Some(true) if !bundle.is_published => {
        bundle.is_published = true;
        bundle.published_at = Some(updated_at);
      }
      Some(false) => {
        bundle.is_published = false;
        bundle.published_at = None;
      }
      _ => {}
    }
    bundle.updated_at = updated_at;
  }
}

/// Parameters for [`crate::store::RegistryStore::list_bundles`].
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BundleQuery {
  pub category:     Option<String>,
  pub is_public:    Option<bool>,
  pub is_published: Option<bool>,
  /// Only bundles carrying this tag.
  pub tag:          Option<String>,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

#[cfg(test)]
mod tests {
  use chrono::{TimeDelta, Utc};

  use super::*;

  #[test]
  fn new_bundle_defaults() {
    let bundle = NewBundle::new("web", "Web", "Web tools").into_bundle(1, Utc::now());
    assert!(bundle.is_public);
    assert!(!bundle.is_published);
    assert_eq!(bundle.download_count, 0);
    assert_eq!(bundle.star_count, 0);
    assert!(bundle.published_at.is_none());
    assert_eq!(bundle.version, "1.0.0");
  }

  #[test]
  fn creating_published_bundle_stamps_published_at() {
    let now = Utc::now();
    let mut input = NewBundle::new("web", "Web", "Web tools");
    input.is_published = true;
    assert_eq!(input.into_bundle(1, now).published_at, Some(now));
  }

  #[test]
  fn publishing_sets_and_withdrawing_clears_published_at() {
    let t0 = Utc::now();
    let mut bundle = NewBundle::new("web", "Web", "Web tools").into_bundle(1, t0);

    let t1 = t0 + TimeDelta::seconds(1);
    BundleUpdate { is_published: Some(true), ..Default::default() }.apply(&mut bundle, t1);
    assert!(bundle.is_published);
    assert_eq!(bundle.published_at, Some(t1));

    // Re-publishing an already published bundle keeps the first stamp.
    let t2 = t1 + TimeDelta::seconds(1);
    BundleUpdate { is_published: Some(true), ..Default::default() }.apply(&mut bundle, t2);
    assert_eq!(bundle.published_at, Some(t1));
    assert_eq!(bundle.updated_at, t2);

    let t3 = t2 + TimeDelta::seconds(1);
    BundleUpdate { is_published: Some(false), ..Default::default() }.apply(&mut bundle, t3);
    assert!(!bundle.is_published);
    assert!(bundle.published_at.is_none());
    assert_eq!(bundle.created_at, t0);
  }
}
