//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields (schemas,
//! rules, tags) are stored as compact JSON. Enumerations are stored as their
//! snake_case names. Booleans are stored as 0/1 integers.
//!
//! Each table has a `*_FIELDS` list naming every column except `id`, in the
//! order both `*_values` (writes) and `Raw*::from_row` (reads) use.

use chrono::{DateTime, Utc};
use rusqlite::{Row, types::Value as SqlValue};
use serde_json::Value;
use toolreg_core::{
  bundle::Bundle,
  policy::{Policy, PolicyScope, PolicyType},
  tool::{Tool, ToolStatus},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── JSON documents ──────────────────────────────────────────────────────────

pub fn encode_json(v: &Value) -> String { v.to_string() }

fn decode_json(s: &str) -> Result<Value> { Ok(serde_json::from_str(s)?) }

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: Option<&[String]>) -> Result<Option<String>> {
  Ok(tags.map(serde_json::to_string).transpose()?)
}

fn decode_tags(s: Option<String>) -> Result<Option<Vec<String>>> {
  Ok(s.as_deref().map(serde_json::from_str).transpose()?)
}

// ─── Constraint violations ───────────────────────────────────────────────────

/// The kind of SQLite constraint a write tripped over, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
  Unique,
  ForeignKey,
}

pub fn constraint_violation(err: &tokio_rusqlite::Error) -> Option<Constraint> {
  let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)) = err
  else {
    return None;
  };
  match e.extended_code {
    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => Some(Constraint::Unique),
    rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
    _ => None,
  }
}

// ─── SQL text ────────────────────────────────────────────────────────────────

/// `id` followed by `fields`, for SELECT lists.
pub fn select_columns(fields: &[&str]) -> String {
  format!("id, {}", fields.join(", "))
}

/// `INSERT` binding `fields` to `?1..?N`.
pub fn insert_sql(table: &str, fields: &[&str]) -> String {
  let placeholders: Vec<String> =
    (1..=fields.len()).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT INTO {table} ({}) VALUES ({})",
    fields.join(", "),
    placeholders.join(", ")
  )
}

/// `UPDATE` binding `fields` to `?1..?N` and the row id to `?N+1`.
pub fn update_sql(table: &str, fields: &[&str]) -> String {
  let assignments: Vec<String> = fields
    .iter()
    .enumerate()
    .map(|(i, f)| format!("{f} = ?{}", i + 1))
    .collect();
  format!(
    "UPDATE {table} SET {} WHERE id = ?{}",
    assignments.join(", "),
    fields.len() + 1
  )
}

// ─── Tools ───────────────────────────────────────────────────────────────────

pub const TOOL_FIELDS: [&str; 16] = [
  "name",
  "display_name",
  "description",
  "version",
  "input_schema",
  "output_schema",
  "function_signature",
  "category",
  "tags",
  "documentation_url",
  "status",
  "is_public",
  "requires_auth",
  "usage_count",
  "created_at",
  "updated_at",
];

pub fn tool_values(tool: &Tool) -> Result<Vec<SqlValue>> {
  Ok(vec![
    tool.name.clone().into(),
    tool.display_name.clone().into(),
    tool.description.clone().into(),
    tool.version.clone().into(),
    encode_json(&tool.input_schema).into(),
    tool.output_schema.as_ref().map(encode_json).into(),
    tool.function_signature.clone().into(),
    tool.category.clone().into(),
    encode_tags(tool.tags.as_deref())?.into(),
    tool.documentation_url.clone().into(),
    tool.status.as_ref().to_owned().into(),
    tool.is_public.into(),
    tool.requires_auth.into(),
    tool.usage_count.into(),
    encode_dt(tool.created_at).into(),
    encode_dt(tool.updated_at).into(),
  ])
}

/// Raw values read directly from a `tools` row.
pub struct RawTool {
  pub id:                 i64,
  pub name:               String,
  pub display_name:       String,
  pub description:        String,
  pub version:            String,
  pub input_schema:       String,
  pub output_schema:      Option<String>,
  pub function_signature: String,
  pub category:           Option<String>,
  pub tags:               Option<String>,
  pub documentation_url:  Option<String>,
  pub status:             String,
  pub is_public:          bool,
  pub requires_auth:      bool,
  pub usage_count:        i64,
  pub created_at:         String,
  pub updated_at:         String,
}

impl RawTool {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      name:               row.get(1)?,
      display_name:       row.get(2)?,
      description:        row.get(3)?,
      version:            row.get(4)?,
      input_schema:       row.get(5)?,
      output_schema:      row.get(6)?,
      function_signature: row.get(7)?,
      category:           row.get(8)?,
      tags:               row.get(9)?,
      documentation_url:  row.get(10)?,
      status:             row.get(11)?,
      is_public:          row.get(12)?,
      requires_auth:      row.get(13)?,
      usage_count:        row.get(14)?,
      created_at:         row.get(15)?,
      updated_at:         row.get(16)?,
    })
  }

  pub fn into_tool(self) -> Result<Tool> {
    Ok(Tool {
      id:                 self.id,
      name:               self.name,
      display_name:       self.display_name,
      description:        self.description,
      version:            self.version,
      input_schema:       decode_json(&self.input_schema)?,
      output_schema:      self.output_schema.as_deref().map(decode_json).transpose()?,
      function_signature: self.function_signature,
      category:           self.category,
      tags:               decode_tags(self.tags)?,
      documentation_url:  self.documentation_url,
      status:             ToolStatus::parse(&self.status)?,
      is_public:          self.is_public,
      requires_auth:      self.requires_auth,
      usage_count:        self.usage_count,
      created_at:         decode_dt(&self.created_at)?,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Bundles ─────────────────────────────────────────────────────────────────

pub const BUNDLE_FIELDS: [&str; 17] = [
  "name",
  "display_name",
  "description",
  "version",
  "author",
  "category",
  "tags",
  "icon_url",
  "documentation_url",
  "repository_url",
  "is_public",
  "is_published",
  "download_count",
  "star_count",
  "created_at",
  "updated_at",
  "published_at",
];

pub fn bundle_values(bundle: &Bundle) -> Result<Vec<SqlValue>> {
  Ok(vec![
    bundle.name.clone().into(),
    bundle.display_name.clone().into(),
    bundle.description.clone().into(),
    bundle.version.clone().into(),
    bundle.author.clone().into(),
    bundle.category.clone().into(),
    encode_tags(bundle.tags.as_deref())?.into(),
    bundle.icon_url.clone().into(),
    bundle.documentation_url.clone().into(),
    bundle.repository_url.clone().into(),
    bundle.is_public.into(),
    bundle.is_published.into(),
    bundle.download_count.into(),
    bundle.star_count.into(),
    encode_dt(bundle.created_at).into(),
    encode_dt(bundle.updated_at).into(),
    bundle.published_at.map(encode_dt).into(),
  ])
}

/// Raw values read directly from a `bundles` row.
pub struct RawBundle {
  pub id:                i64,
  pub name:              String,
  pub display_name:      String,
  pub description:       String,
  pub version:           String,
  pub author:            Option<String>,
  pub category:          Option<String>,
  pub tags:              Option<String>,
  pub icon_url:          Option<String>,
  pub documentation_url: Option<String>,
  pub repository_url:    Option<String>,
  pub is_public:         bool,
  pub is_published:      bool,
  pub download_count:    i64,
  pub star_count:        i64,
  pub created_at:        String,
  pub updated_at:        String,
  pub published_at:      Option<String>,
}

impl RawBundle {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      name:              row.get(1)?,
      display_name:      row.get(2)?,
      description:       row.get(3)?,
      version:           row.get(4)?,
      author:            row.get(5)?,
      category:          row.get(6)?,
      tags:              row.get(7)?,
      icon_url:          row.get(8)?,
      documentation_url: row.get(9)?,
      repository_url:    row.get(10)?,
      is_public:         row.get(11)?,
      is_published:      row.get(12)?,
      download_count:    row.get(13)?,
      star_count:        row.get(14)?,
      created_at:        row.get(15)?,
      updated_at:        row.get(16)?,
      published_at:      row.get(17)?,
    })
  }

  pub fn into_bundle(self) -> Result<Bundle> {
    Ok(Bundle {
      id:                self.id,
      name:              self.name,
      display_name:      self.display_name,
      description:       self.description,
      version:           self.version,
      author:            self.author,
      category:          self.category,
      tags:              decode_tags(self.tags)?,
      icon_url:          self.icon_url,
      documentation_url: self.documentation_url,
      repository_url:    self.repository_url,
      is_public:         self.is_public,
      is_published:      self.is_published,
      download_count:    self.download_count,
      star_count:        self.star_count,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
      published_at:      decode_opt_dt(self.published_at)?,
    })
  }
}

// ─── Policies ────────────────────────────────────────────────────────────────

pub const POLICY_FIELDS: [&str; 14] = [
  "name",
  "display_name",
  "description",
  "policy_type",
  "scope",
  "rules",
  "bundle_id",
  "is_active",
  "priority",
  "tags",
  "created_at",
  "updated_at",
  "effective_from",
  "effective_until",
];

pub fn policy_values(policy: &Policy) -> Result<Vec<SqlValue>> {
  Ok(vec![
    policy.name.clone().into(),
    policy.display_name.clone().into(),
    policy.description.clone().into(),
    policy.policy_type.as_ref().to_owned().into(),
    policy.scope.as_ref().to_owned().into(),
    encode_json(&policy.rules).into(),
    policy.bundle_id.into(),
    policy.is_active.into(),
    policy.priority.into(),
    encode_tags(policy.tags.as_deref())?.into(),
    encode_dt(policy.created_at).into(),
    encode_dt(policy.updated_at).into(),
    policy.effective_from.map(encode_dt).into(),
    policy.effective_until.map(encode_dt).into(),
  ])
}

/// Raw values read directly from a `policies` row.
pub struct RawPolicy {
  pub id:              i64,
  pub name:            String,
  pub display_name:    String,
  pub description:     String,
  pub policy_type:     String,
  pub scope:           String,
  pub rules:           String,
  pub bundle_id:       Option<i64>,
  pub is_active:       bool,
  pub priority:        i32,
  pub tags:            Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
  pub effective_from:  Option<String>,
  pub effective_until: Option<String>,
}

impl RawPolicy {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      name:            row.get(1)?,
      display_name:    row.get(2)?,
      description:     row.get(3)?,
      policy_type:     row.get(4)?,
      scope:           row.get(5)?,
      rules:           row.get(6)?,
      bundle_id:       row.get(7)?,
      is_active:       row.get(8)?,
      priority:        row.get(9)?,
      tags:            row.get(10)?,
      created_at:      row.get(11)?,
      updated_at:      row.get(12)?,
      effective_from:  row.get(13)?,
      effective_until: row.get(14)?,
    })
  }

  pub fn into_policy(self) -> Result<Policy> {
    Ok(Policy {
      id:              self.id,
      name:            self.name,
      display_name:    self.display_name,
      description:     self.description,
      policy_type:     PolicyType::parse(&self.policy_type)?,
      scope:           PolicyScope::parse(&self.scope)?,
      rules:           decode_json(&self.rules)?,
      bundle_id:       self.bundle_id,
      is_active:       self.is_active,
      priority:        self.priority,
      tags:            decode_tags(self.tags)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
      effective_from:  decode_opt_dt(self.effective_from)?,
      effective_until: decode_opt_dt(self.effective_until)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rfc3339_roundtrip_keeps_sub_second_precision() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }

  #[test]
  fn update_sql_binds_id_after_fields() {
    assert_eq!(
      update_sql("t", &["a", "b"]),
      "UPDATE t SET a = ?1, b = ?2 WHERE id = ?3"
    );
    assert_eq!(insert_sql("t", &["a", "b"]), "INSERT INTO t (a, b) VALUES (?1, ?2)");
  }

  #[test]
  fn unknown_enum_in_column_is_a_decode_error() {
    let raw = RawPolicy {
      id:              1,
      name:            "p".into(),
      display_name:    "P".into(),
      description:     "d".into(),
      policy_type:     "bribery".into(),
      scope:           "global".into(),
      rules:           "{}".into(),
      bundle_id:       None,
      is_active:       true,
      priority:        0,
      tags:            None,
      created_at:      encode_dt(Utc::now()),
      updated_at:      encode_dt(Utc::now()),
      effective_from:  None,
      effective_until: None,
    };
    assert!(matches!(raw.into_policy(), Err(Error::Core(_))));
  }

  #[test]
  fn field_lists_match_value_lists() {
    use serde_json::json;
    use toolreg_core::{bundle::NewBundle, policy::NewPolicy, tool::NewTool};

    let now = Utc::now();
    let tool = NewTool::new("t", "T", "d", json!({}), "t()").into_tool(1, now);
    let bundle = NewBundle::new("b", "B", "d").into_bundle(1, now);
    let policy = NewPolicy::new("p", "P", "d", PolicyType::Security, PolicyScope::Tool, json!({}))
      .into_policy(1, now);

    assert_eq!(tool_values(&tool).unwrap().len(), TOOL_FIELDS.len());
    assert_eq!(bundle_values(&bundle).unwrap().len(), BUNDLE_FIELDS.len());
    assert_eq!(policy_values(&policy).unwrap().len(), POLICY_FIELDS.len());
  }
}
