//! Policy types: named rule sets for access, rate limits, quotas and
//! security.
//!
//! `rules` is an opaque document whose shape depends on `policy_type`. The
//! registry stores it verbatim; `priority` and the effective window are data
//! only and are not evaluated here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::{Result, default_true, error::parse_variant, nullable, touch};

// ─── Classification ──────────────────────────────────────────────────────────

/// What kind of rule set a policy carries.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PolicyType {
  AccessControl,
  RateLimit,
  UsageQuota,
  Permission,
  Security,
}

impl PolicyType {
  pub fn parse(s: &str) -> Result<Self> { parse_variant("policy type", s) }
}

/// The level a policy applies at.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PolicyScope {
  Global,
  Bundle,
  Tool,
  User,
  Organization,
}

impl PolicyScope {
  pub fn parse(s: &str) -> Result<Self> { parse_variant("policy scope", s) }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// A policy as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Policy {
  pub id:              i64,
  pub name:            String,
  pub display_name:    String,
  pub description:     String,
  pub policy_type:     PolicyType,
  pub scope:           PolicyScope,
  #[schema(value_type = Object)]
  pub rules:           Value,
  /// Owning bundle; the policy is deleted together with it.
  pub bundle_id:       Option<i64>,
  pub is_active:       bool,
  /// Higher priority policies are meant to override lower ones.
  pub priority:        i32,
  pub tags:            Option<Vec<String>>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  /// Open-ended when unset.
  pub effective_from:  Option<DateTime<Utc>>,
  /// Open-ended when unset.
  pub effective_until: Option<DateTime<Utc>>,
}

/// Input to [`crate::store::RegistryStore::create_policy`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewPolicy {
  pub name:            String,
  pub display_name:    String,
  pub description:     String,
  pub policy_type:     PolicyType,
  pub scope:           PolicyScope,
  #[schema(value_type = Object)]
  pub rules:           Value,
  #[serde(default)]
  pub bundle_id:       Option<i64>,
  #[serde(default = "default_true")]
  pub is_active:       bool,
  #[serde(default)]
  pub priority:        i32,
  #[serde(default)]
  pub tags:            Option<Vec<String>>,
  #[serde(default)]
  pub effective_from:  Option<DateTime<Utc>>,
  #[serde(default)]
  pub effective_until: Option<DateTime<Utc>>,
}

impl NewPolicy {
  pub fn new(
    name: impl Into<String>,
    display_name: impl Into<String>,
    description: impl Into<String>,
    policy_type: PolicyType,
    scope: PolicyScope,
    rules: Value,
  ) -> Self {
    Self {
      name: name.into(),
      display_name: display_name.into(),
      description: description.into(),
      policy_type,
      scope,
      rules,
      bundle_id: None,
      is_active: true,
      priority: 0,
      tags: None,
      effective_from: None,
      effective_until: None,
    }
  }

  /// Materialise the row the store will insert.
  pub fn into_policy(self, id: i64, now: DateTime<Utc>) -> Policy {
    Policy {
      id,
      name: self.name,
      display_name: self.display_name,
      description: self.description,
      policy_type: self.policy_type,
      scope: self.scope,
      rules: self.rules,
      bundle_id: self.bundle_id,
      is_active: self.is_active,
      priority: self.priority,
      tags: self.tags,
      created_at: now,
      updated_at: now,
      effective_from: self.effective_from,
      effective_until: self.effective_until,
    }
  }
}

/// Partial update for a policy. `None` leaves the field unchanged.
///
/// `bundle_id` and the effective window are nullable: an explicit JSON `null`
/// clears them, an absent key keeps them.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct PolicyUpdate {
  pub name:            Option<String>,
  pub display_name:    Option<String>,
  pub description:     Option<String>,
  pub policy_type:     Option<PolicyType>,
  pub scope:           Option<PolicyScope>,
  #[schema(value_type = Option<Object>)]
  pub rules:           Option<Value>,
  #[serde(deserialize_with = "nullable")]
  #[schema(value_type = Option<i64>)]
  pub bundle_id:       Option<Option<i64>>,
  pub is_active:       Option<bool>,
  pub priority:        Option<i32>,
  pub tags:            Option<Vec<String>>,
  #[serde(deserialize_with = "nullable")]
  #[schema(value_type = Option<DateTime<Utc>>)]
  pub effective_from:  Option<Option<DateTime<Utc>>>,
  #[serde(deserialize_with = "nullable")]
  #[schema(value_type = Option<DateTime<Utc>>)]
  pub effective_until: Option<Option<DateTime<Utc>>>,
}

impl PolicyUpdate {
  /// Apply the patch to `policy`, refreshing `updated_at`.
  pub fn apply(self, policy: &mut Policy, now: DateTime<Utc>) {
    if let Some(v) = self.name { policy.name = v; }
    if let Some(v) = self.display_name { policy.display_name = v; }
    if let Some(v) = self.description { policy.description = v; }
    if let Some(v) = self.policy_type { policy.policy_type = v; }
    if let Some(v) = self.scope { policy.scope = v; }
    if let Some(v) = self.rules { policy.rules = v; }
    if let Some(v) = self.bundle_id { policy.bundle_id = v; }
    if let Some(v) = self.is_active { policy.is_active = v; }
    if let Some(v) = self.priority { policy.priority = v; }
    if let Some(v) = self.tags { policy.tags = Some(v); }
    if let Some(v) = self.effective_from { policy.effective_from = v; }
    if let Some(v) = self.effective_until { policy.effective_until = v; }
    policy.updated_at = touch(policy.updated_at, now);
  }
}

/// Parameters for [`crate::store::RegistryStore::list_policies`].
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PolicyQuery {
  pub policy_type: Option<PolicyType>,
  pub scope:       Option<PolicyScope>,
  pub bundle_id:   Option<i64>,
  pub is_active:   Option<bool>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn enum_strings_are_snake_case() {
    assert_eq!(PolicyType::AccessControl.to_string(), "access_control");
    assert_eq!(PolicyType::parse("usage_quota").unwrap(), PolicyType::UsageQuota);
    assert_eq!(PolicyScope::Organization.as_ref(), "organization");
    assert_eq!(
      serde_json::to_value(PolicyType::RateLimit).unwrap(),
      json!("rate_limit")
    );
    assert!(PolicyScope::parse("planet").is_err());
  }

  #[test]
  fn new_policy_body_fills_defaults() {
    let body = json!({
      "name": "default-rate",
      "display_name": "Default rate limit",
      "description": "100 calls per minute",
      "policy_type": "rate_limit",
      "scope": "global",
      "rules": {"per_minute": 100}
    });
    let policy = serde_json::from_value::<NewPolicy>(body)
      .unwrap()
      .into_policy(3, Utc::now());

    assert!(policy.is_active);
    assert_eq!(policy.priority, 0);
    assert!(policy.bundle_id.is_none());
    assert!(policy.effective_from.is_none());
    assert!(policy.effective_until.is_none());
    assert_eq!(policy.rules, json!({"per_minute": 100}));
  }

  #[test]
  fn update_null_clears_absent_keeps() {
    let now = Utc::now();
    let mut policy = NewPolicy {
      bundle_id: Some(4),
      effective_from: Some(now),
      effective_until: Some(now),
      ..NewPolicy::new("p", "P", "d", PolicyType::Security, PolicyScope::Bundle, json!({}))
    }
    .into_policy(1, now);

    let update: PolicyUpdate =
      serde_json::from_value(json!({"bundle_id": null, "effective_until": null})).unwrap();
    assert_eq!(update.bundle_id, Some(None));
    assert_eq!(update.effective_from, None);
    update.apply(&mut policy, now);

    assert_eq!(policy.bundle_id, None);
    assert_eq!(policy.effective_until, None);
    assert_eq!(policy.effective_from, Some(now));
  }

  #[test]
  fn update_value_sets_nullable_field() {
    let update: PolicyUpdate = serde_json::from_value(json!({"bundle_id": 9})).unwrap();
    assert_eq!(update.bundle_id, Some(Some(9)));
  }
}
