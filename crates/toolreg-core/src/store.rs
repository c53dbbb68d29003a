//! The `RegistryStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `toolreg-store-sqlite`).
//! Higher layers (`toolreg-api`, `toolreg-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  bundle::{Bundle, BundleQuery, BundleUpdate, NewBundle},
  policy::{NewPolicy, Policy, PolicyQuery, PolicyUpdate},
  tool::{NewTool, Tool, ToolQuery, ToolUpdate},
};

/// Rows returned by a list call when the query sets no `limit`.
pub const DEFAULT_LIST_LIMIT: usize = 100;

// ─── Error classification ────────────────────────────────────────────────────

/// Backend-independent classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The addressed row does not exist.
  NotFound,
  /// A uniqueness constraint (entity name) was violated.
  Conflict,
  /// The input references something that does not exist, or is otherwise
  /// rejected by the store.
  Invalid,
  Internal,
}

/// Implemented by backend error types so transport layers can map failures
/// without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a tool registry backend.
///
/// Every entity follows the same shape: create, fetch by id or unique name,
/// list with filters, partial update, delete. Ids, counters and timestamps
/// are assigned by the store.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RegistryStore: Send + Sync {
  type Error: StoreError;

  // ── Tools ─────────────────────────────────────────────────────────────

  /// Persist a new tool. Fails with a conflict if the name is taken.
  fn create_tool(
    &self,
    input: NewTool,
  ) -> impl Future<Output = Result<Tool, Self::Error>> + Send + '_;

  fn get_tool(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Tool>, Self::Error>> + Send + '_;

  fn get_tool_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Tool>, Self::Error>> + Send + 'a;

  /// Tools matching `query`, ordered by id.
  fn list_tools<'a>(
    &'a self,
    query: &'a ToolQuery,
  ) -> impl Future<Output = Result<Vec<Tool>, Self::Error>> + Send + 'a;

  /// Apply a partial update. `created_at` is preserved and `updated_at` is
  /// always advanced.
  fn update_tool(
    &self,
    id: i64,
    update: ToolUpdate,
  ) -> impl Future<Output = Result<Tool, Self::Error>> + Send + '_;

  fn delete_tool(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Bundles ───────────────────────────────────────────────────────────

  fn create_bundle(
    &self,
    input: NewBundle,
  ) -> impl Future<Output = Result<Bundle, Self::Error>> + Send + '_;

  fn get_bundle(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Bundle>, Self::Error>> + Send + '_;

  fn get_bundle_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Bundle>, Self::Error>> + Send + 'a;

  fn list_bundles<'a>(
    &'a self,
    query: &'a BundleQuery,
  ) -> impl Future<Output = Result<Vec<Bundle>, Self::Error>> + Send + 'a;

  fn update_bundle(
    &self,
    id: i64,
    update: BundleUpdate,
  ) -> impl Future<Output = Result<Bundle, Self::Error>> + Send + '_;

  /// Delete a bundle together with every policy that belongs to it.
  fn delete_bundle(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Policies ──────────────────────────────────────────────────────────

  /// Persist a new policy. A `bundle_id` naming a missing bundle is
  /// rejected.
  fn create_policy(
    &self,
    input: NewPolicy,
  ) -> impl Future<Output = Result<Policy, Self::Error>> + Send + '_;

  fn get_policy(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Policy>, Self::Error>> + Send + '_;

  fn get_policy_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Policy>, Self::Error>> + Send + 'a;

  fn list_policies<'a>(
    &'a self,
    query: &'a PolicyQuery,
  ) -> impl Future<Output = Result<Vec<Policy>, Self::Error>> + Send + 'a;

  fn update_policy(
    &self,
    id: i64,
    update: PolicyUpdate,
  ) -> impl Future<Output = Result<Policy, Self::Error>> + Send + '_;

  fn delete_policy(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
