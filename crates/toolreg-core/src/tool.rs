//! Tool types: a callable capability exposed to consumers.
//!
//! A tool is identified by a globally unique `name` and declares the JSON
//! shape of its inputs (always) and outputs (optionally). Schemas are stored
//! as opaque documents; nothing in the registry interprets them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::{Result, default_true, default_version, error::parse_variant, touch};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of a tool.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolStatus {
  #[default]
  Active,
  Deprecated,
  Archived,
}

impl ToolStatus {
  /// Decode the string stored in the `status` column.
  pub fn parse(s: &str) -> Result<Self> { parse_variant("tool status", s) }
}

// ─── Tool ────────────────────────────────────────────────────────────────────

/// A registered tool as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Tool {
  pub id:                 i64,
  pub name:               String,
  pub display_name:       String,
  pub description:        String,
  pub version:            String,
  /// JSON Schema for the tool's inputs.
  #[schema(value_type = Object)]
  pub input_schema:       Value,
  /// JSON Schema for the tool's outputs, if declared.
  #[schema(value_type = Option<Object>)]
  pub output_schema:      Option<Value>,
  pub function_signature: String,
  pub category:           Option<String>,
  pub tags:               Option<Vec<String>>,
  pub documentation_url:  Option<String>,
  pub status:             ToolStatus,
  pub is_public:          bool,
  /// Informational only; no authentication flow consults it.
  pub requires_auth:      bool,
  pub usage_count:        i64,
  /// Server-assigned; never changes after creation.
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
}

// ─── NewTool ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::RegistryStore::create_tool`].
///
/// Ids, counters and timestamps are always assigned by the store.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewTool {
  pub name:               String,
  pub display_name:       String,
  pub description:        String,
  #[serde(default = "default_version")]
  pub version:            String,
  #[schema(value_type = Object)]
  pub input_schema:       Value,
  #[serde(default)]
  #[schema(value_type = Option<Object>)]
  pub output_schema:      Option<Value>,
  pub function_signature: String,
  #[serde(default)]
  pub category:           Option<String>,
  #[serde(default)]
  pub tags:               Option<Vec<String>>,
  #[serde(default)]
  pub documentation_url:  Option<String>,
  #[serde(default)]
  pub status:             ToolStatus,
  #[serde(default = "default_true")]
  pub is_public:          bool,
  #[serde(default)]
  pub requires_auth:      bool,
}

impl NewTool {
  /// Convenience constructor with all optional fields set to their defaults.
  pub fn new(
    name: impl Into<String>,
    display_name: impl Into<String>,
    description: impl Into<String>,
    input_schema: Value,
    function_signature: impl Into<String>,
  ) -> Self {
    Self {
      name: name.into(),
      display_name: display_name.into(),
      description: description.into(),
      version: default_version(),
      input_schema,
      output_schema: None,
      function_signature: function_signature.into(),
      category: None,
      tags: None,
      documentation_url: None,
      status: ToolStatus::default(),
      is_public: true,
      requires_auth: false,
    }
  }

  /// Materialise the row the store will insert.
  pub fn into_tool(self, id: i64, now: DateTime<Utc>) -> Tool {
    Tool {
      id,
      name: self.name,
      display_name: self.display_name,
      description: self.description,
      version: self.version,
      input_schema: self.input_schema,
      output_schema: self.output_schema,
      function_signature: self.function_signature,
      category: self.category,
      tags: self.tags,
      documentation_url: self.documentation_url,
      status: self.status,
      is_public: self.is_public,
      requires_auth: self.requires_auth,
      usage_count: 0,
      created_at: now,
      updated_at: now,
    }
  }
}

// ─── ToolUpdate ──────────────────────────────────────────────────────────────

/// Partial update for a tool. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ToolUpdate {
  pub name:               Option<String>,
  pub display_name:       Option<String>,
  pub description:        Option<String>,
  pub version:            Option<String>,
  #[schema(value_type = Option<Object>)]
  pub input_schema:       Option<Value>,
  #[schema(value_type = Option<Object>)]
  pub output_schema:      Option<Value>,
  pub function_signature: Option<String>,
  pub category:           Option<String>,
  pub tags:               Option<Vec<String>>,
  pub documentation_url:  Option<String>,
  pub status:             Option<ToolStatus>,
  pub is_public:          Option<bool>,
  pub requires_auth:      Option<bool>,
}

impl ToolUpdate {
  /// Apply the patch to `tool`, refreshing `updated_at`.
  pub fn apply(self, tool: &mut Tool, now: DateTime<Utc>) {
    if let Some(v) = self.name { tool.name = v; }
    if let Some(v) = self.display_name { tool.display_name = v; }
    if let Some(v) = self.description { tool.description = v; }
    if let Some(v) = self.version { tool.version = v; }
    if let Some(v) = self.input_schema { tool.input_schema = v; }
    if let Some(v) = self.output_schema { tool.output_schema = Some(v); }
    if let Some(v) = self.function_signature { tool.function_signature = v; }
    if let Some(v) = self.category { tool.category = Some(v); }
    if let Some(v) = self.tags { tool.tags = Some(v); }
    if let Some(v) = self.documentation_url { tool.documentation_url = Some(v); }
    if let Some(v) = self.status { tool.status = v; }
    if let Some(v) = self.is_public { tool.is_public = v; }
    if let Some(v) = self.requires_auth { tool.requires_auth = v; }
    tool.updated_at = touch(tool.updated_at, now);
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::RegistryStore::list_tools`].
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ToolQuery {
  pub category:  Option<String>,
  pub status:    Option<ToolStatus>,
  pub is_public: Option<bool>,
  /// Only tools carrying this tag.
  pub tag:       Option<String>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}
