//! [`SqliteStore`], the SQLite implementation of [`RegistryStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, Row, params_from_iter, types::Value as SqlValue};

use toolreg_core::{
  bundle::{Bundle, BundleQuery, BundleUpdate, NewBundle},
  policy::{NewPolicy, Policy, PolicyQuery, PolicyUpdate},
  store::RegistryStore,
  tool::{NewTool, Tool, ToolQuery, ToolUpdate},
};

use crate::{
  encode::{
    BUNDLE_FIELDS, Constraint, POLICY_FIELDS, RawBundle, RawPolicy, RawTool,
    TOOL_FIELDS, bundle_values, constraint_violation, insert_sql, policy_values,
    select_columns, tool_values, update_sql,
  },
  filter::Filter,
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tool registry backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised onto the connection's background thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection. Calls on other clones fail afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    tracing::debug!("sqlite connection closed");
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a query expected to return at most one row.
  async fn fetch_optional<T, F>(
    &self,
    sql: String,
    params: Vec<SqlValue>,
    read: F,
  ) -> Result<Option<T>>
  where
    T: Send + 'static,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(&sql, params_from_iter(params), read).optional()?)
        })
        .await?,
    )
  }

  async fn fetch_all<T, F>(
    &self,
    sql: String,
    params: Vec<SqlValue>,
    read: F,
  ) -> Result<Vec<T>>
  where
    T: Send + 'static,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map(params_from_iter(params), read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  /// Execute a single write and return the affected row count and the last
  /// inserted rowid.
  async fn write(
    &self,
    sql: String,
    params: Vec<SqlValue>,
  ) -> std::result::Result<(usize, i64), tokio_rusqlite::Error> {
    self
      .conn
      .call(move |conn| {
        let changed = conn.execute(&sql, params_from_iter(params))?;
        Ok((changed, conn.last_insert_rowid()))
      })
      .await
  }

  async fn delete_row(&self, table: &str, id: i64) -> Result<bool> {
    let (changed, _) = self
      .write(format!("DELETE FROM {table} WHERE id = ?1"), vec![id.into()])
      .await?;
    Ok(changed > 0)
  }
}

/// Translate a failed write into the domain error for a named row.
fn write_error(
  err: tokio_rusqlite::Error,
  entity: &'static str,
  name: &str,
  bundle_id: Option<i64>,
) -> Error {
  match (constraint_violation(&err), bundle_id) {
    (Some(Constraint::Unique), _) => Error::DuplicateName {
      entity,
      name: name.to_owned(),
    },
    (Some(Constraint::ForeignKey), Some(id)) => Error::UnknownBundle(id),
    _ => Error::Database(err),
  }
}

fn by_id(table: &str, fields: &[&str]) -> String {
  format!("SELECT {} FROM {table} WHERE id = ?1", select_columns(fields))
}

fn by_name(table: &str, fields: &[&str]) -> String {
  format!("SELECT {} FROM {table} WHERE name = ?1", select_columns(fields))
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = Error;

  // ── Tools ─────────────────────────────────────────────────────────────────

  async fn create_tool(&self, input: NewTool) -> Result<Tool> {
    let mut tool = input.into_tool(0, Utc::now());
    let values = tool_values(&tool)?;

    let (_, id) = self
      .write(insert_sql("tools", &TOOL_FIELDS), values)
      .await
      .map_err(|e| write_error(e, "tool", &tool.name, None))?;

    tool.id = id;
    tracing::debug!(id, name = %tool.name, "tool created");
    Ok(tool)
  }

  async fn get_tool(&self, id: i64) -> Result<Option<Tool>> {
    let raw = self
      .fetch_optional(by_id("tools", &TOOL_FIELDS), vec![id.into()], RawTool::from_row)
      .await?;
    raw.map(RawTool::into_tool).transpose()
  }

  async fn get_tool_by_name(&self, name: &str) -> Result<Option<Tool>> {
    let raw = self
      .fetch_optional(
        by_name("tools", &TOOL_FIELDS),
        vec![name.to_owned().into()],
        RawTool::from_row,
      )
      .await?;
    raw.map(RawTool::into_tool).transpose()
  }

  async fn list_tools(&self, query: &ToolQuery) -> Result<Vec<Tool>> {
    let mut filter = Filter::default();
    if let Some(category) = &query.category {
      filter.eq("category", category.clone());
    }
    if let Some(status) = query.status {
      filter.eq("status", status.as_ref().to_owned());
    }
    if let Some(is_public) = query.is_public {
      filter.eq("is_public", is_public);
    }
    if let Some(tag) = &query.tag {
      filter.has_tag("tools", tag);
    }
    let (sql, params) =
      filter.into_select("tools", &TOOL_FIELDS, query.limit, query.offset);

    let raws = self.fetch_all(sql, params, RawTool::from_row).await?;
    raws.into_iter().map(RawTool::into_tool).collect()
  }

  async fn update_tool(&self, id: i64, update: ToolUpdate) -> Result<Tool> {
    let mut tool = self.get_tool(id).await?.ok_or(Error::ToolNotFound(id))?;
    update.apply(&mut tool, Utc::now());

    let mut values = tool_values(&tool)?;
    values.push(id.into());
    let (changed, _) = self
      .write(update_sql("tools", &TOOL_FIELDS), values)
      .await
      .map_err(|e| write_error(e, "tool", &tool.name, None))?;

    // The row may have been deleted between the read and the write.
    if changed == 0 {
      return Err(Error::ToolNotFound(id));
    }
    Ok(tool)
  }

  async fn delete_tool(&self, id: i64) -> Result<()> {
    if !self.delete_row("tools", id).await? {
      return Err(Error::ToolNotFound(id));
    }
    tracing::debug!(id, "tool deleted");
    Ok(())
  }

  // ── Bundles ───────────────────────────────────────────────────────────────

  async fn create_bundle(&self, input: NewBundle) -> Result<Bundle> {
    let mut bundle = input.into_bundle(0, Utc::now());
    let values = bundle_values(&bundle)?;

    let (_, id) = self
      .write(insert_sql("bundles", &BUNDLE_FIELDS), values)
      .await
      .map_err(|e| write_error(e, "bundle", &bundle.name, None))?;

    bundle.id = id;
    tracing::debug!(id, name = %bundle.name, "bundle created");
    Ok(bundle)
  }

  async fn get_bundle(&self, id: i64) -> Result<Option<Bundle>> {
    let raw = self
      .fetch_optional(
        by_id("bundles", &BUNDLE_FIELDS),
        vec![id.into()],
        RawBundle::from_row,
      )
      .await?;
    raw.map(RawBundle::into_bundle).transpose()
  }

  async fn get_bundle_by_name(&self, name: &str) -> Result<Option<Bundle>> {
    let raw = self
      .fetch_optional(
        by_name("bundles", &BUNDLE_FIELDS),
        vec![name.to_owned().into()],
        RawBundle::from_row,
      )
      .await?;
    raw.map(RawBundle::into_bundle).transpose()
  }

  async fn list_bundles(&self, query: &BundleQuery) -> Result<Vec<Bundle>> {
    let mut filter = Filter::default();
    if let Some(category) = &query.category {
      filter.eq("category", category.clone());
    }
    if let Some(is_public) = query.is_public {
      filter.eq("is_public", is_public);
    }
    if let Some(is_published) = query.is_published {
      filter.eq("is_published", is_published);
    }
    if let Some(tag) = &query.tag {
      filter.has_tag("bundles", tag);
    }
    let (sql, params) =
      filter.into_select("bundles", &BUNDLE_FIELDS, query.limit, query.offset);

    let raws = self.fetch_all(sql, params, RawBundle::from_row).await?;
    raws.into_iter().map(RawBundle::into_bundle).collect()
  }

  async fn update_bundle(&self, id: i64, update: BundleUpdate) -> Result<Bundle> {
    let mut bundle = self.get_bundle(id).await?.ok_or(Error::BundleNotFound(id))?;
    update.apply(&mut bundle, Utc::now());

    let mut values = bundle_values(&bundle)?;
    values.push(id.into());
    let (changed, _) = self
      .write(update_sql("bundles", &BUNDLE_FIELDS), values)
      .await
      .map_err(|e| write_error(e, "bundle", &bundle.name, None))?;

    if changed == 0 {
      return Err(Error::BundleNotFound(id));
    }
    Ok(bundle)
  }

  async fn delete_bundle(&self, id: i64) -> Result<()> {
    // Owned policies go with it via ON DELETE CASCADE.
    if !self.delete_row("bundles", id).await? {
      return Err(Error::BundleNotFound(id));
    }
    tracing::debug!(id, "bundle deleted");
    Ok(())
  }

  // ── Policies ──────────────────────────────────────────────────────────────

  async fn create_policy(&self, input: NewPolicy) -> Result<Policy> {
    let mut policy = input.into_policy(0, Utc::now());
    let values = policy_values(&policy)?;

    let (_, id) = self
      .write(insert_sql("policies", &POLICY_FIELDS), values)
      .await
      .map_err(|e| write_error(e, "policy", &policy.name, policy.bundle_id))?;

    policy.id = id;
    tracing::debug!(id, name = %policy.name, "policy created");
    Ok(policy)
  }

  async fn get_policy(&self, id: i64) -> Result<Option<Policy>> {
    let raw = self
      .fetch_optional(
        by_id("policies", &POLICY_FIELDS),
        vec![id.into()],
        RawPolicy::from_row,
      )
      .await?;
    raw.map(RawPolicy::into_policy).transpose()
  }

  async fn get_policy_by_name(&self, name: &str) -> Result<Option<Policy>> {
    let raw = self
      .fetch_optional(
        by_name("policies", &POLICY_FIELDS),
        vec![name.to_owned().into()],
        RawPolicy::from_row,
      )
      .await?;
    raw.map(RawPolicy::into_policy).transpose()
  }

  async fn list_policies(&self, query: &PolicyQuery) -> Result<Vec<Policy>> {
    let mut filter = Filter::default();
    if let Some(policy_type) = query.policy_type {
      filter.eq("policy_type", policy_type.as_ref().to_owned());
    }
    if let Some(scope) = query.scope {
      filter.eq("scope", scope.as_ref().to_owned());
    }
    if let Some(bundle_id) = query.bundle_id {
      filter.eq("bundle_id", bundle_id);
    }
    if let Some(is_active) = query.is_active {
      filter.eq("is_active", is_active);
    }
    let (sql, params) =
      filter.into_select("policies", &POLICY_FIELDS, query.limit, query.offset);

    let raws = self.fetch_all(sql, params, RawPolicy::from_row).await?;
    raws.into_iter().map(RawPolicy::into_policy).collect()
  }

  async fn update_policy(&self, id: i64, update: PolicyUpdate) -> Result<Policy> {
    let mut policy = self.get_policy(id).await?.ok_or(Error::PolicyNotFound(id))?;
    update.apply(&mut policy, Utc::now());

    let mut values = policy_values(&policy)?;
    values.push(id.into());
    let (changed, _) = self
      .write(update_sql("policies", &POLICY_FIELDS), values)
      .await
      .map_err(|e| write_error(e, "policy", &policy.name, policy.bundle_id))?;

    if changed == 0 {
      return Err(Error::PolicyNotFound(id));
    }
    Ok(policy)
  }

  async fn delete_policy(&self, id: i64) -> Result<()> {
    if !self.delete_row("policies", id).await? {
      return Err(Error::PolicyNotFound(id));
    }
    tracing::debug!(id, "policy deleted");
    Ok(())
  }
}
