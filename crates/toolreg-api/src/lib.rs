//! JSON REST API for the tool registry.
//!
//! Exposes an axum [`Router`] backed by any [`toolreg_core::store::RegistryStore`].
//! CORS, docs, TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", toolreg_api::api_router(store.clone()))
//! ```

pub mod bundles;
pub mod error;
pub mod policies;
pub mod tools;

use std::sync::Arc;

use axum::{Router, routing::get};
use toolreg_core::{
  bundle::{Bundle, BundleUpdate, NewBundle},
  policy::{NewPolicy, Policy, PolicyScope, PolicyType, PolicyUpdate},
  store::RegistryStore,
  tool::{NewTool, Tool, ToolStatus, ToolUpdate},
};
use utoipa::OpenApi;

pub use error::ApiError;

/// OpenAPI description of the routes built by [`api_router`], relative to
/// its mount point.
#[derive(OpenApi)]
#[openapi(
  paths(
    tools::list,
    tools::create,
    tools::get_one,
    tools::get_by_name,
    tools::update,
    tools::delete,
    bundles::list,
    bundles::create,
    bundles::get_one,
    bundles::get_by_name,
    bundles::update,
    bundles::delete,
    policies::list,
    policies::create,
    policies::get_one,
    policies::get_by_name,
    policies::update,
    policies::delete,
  ),
  components(schemas(
    Tool,
    NewTool,
    ToolUpdate,
    ToolStatus,
    Bundle,
    NewBundle,
    BundleUpdate,
    Policy,
    NewPolicy,
    PolicyUpdate,
    PolicyType,
    PolicyScope,
  )),
  tags(
    (name = "Tools", description = "Callable capabilities and their schemas"),
    (name = "Bundles", description = "Named, versioned groupings of tools"),
    (name = "Policies", description = "Stored rule sets; not evaluated by the registry"),
  )
)]
pub struct ApiDoc;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RegistryStore + 'static,
{
  Router::new()
    // Tools
    .route("/tools", get(tools::list::<S>).post(tools::create::<S>))
    .route("/tools/by-name/{name}", get(tools::get_by_name::<S>))
    .route(
      "/tools/{id}",
      get(tools::get_one::<S>)
        .patch(tools::update::<S>)
        .delete(tools::delete::<S>),
    )
    // Bundles
    .route("/bundles", get(bundles::list::<S>).post(bundles::create::<S>))
    .route("/bundles/by-name/{name}", get(bundles::get_by_name::<S>))
    .route(
      "/bundles/{id}",
      get(bundles::get_one::<S>)
        .patch(bundles::update::<S>)
        .delete(bundles::delete::<S>),
    )
    // Policies
    .route("/policies", get(policies::list::<S>).post(policies::create::<S>))
    .route("/policies/by-name/{name}", get(policies::get_by_name::<S>))
    .route(
      "/policies/{id}",
      get(policies::get_one::<S>)
        .patch(policies::update::<S>)
        .delete(policies::delete::<S>),
    )
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use toolreg_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store))
  }

  async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = app
      .clone()
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
  }

  fn tool_body(name: &str) -> Value {
    json!({
      "name": name,
      "display_name": "Weather",
      "description": "Current weather for a city",
      "input_schema": {"type": "object", "required": ["city"]},
      "function_signature": "weather(city: str) -> dict"
    })
  }

  fn policy_body(name: &str, bundle_id: Option<i64>) -> Value {
    json!({
      "name": name,
      "display_name": "Quota",
      "description": "Monthly quota",
      "policy_type": "usage_quota",
      "scope": "bundle",
      "rules": {"monthly": 1000},
      "bundle_id": bundle_id
    })
  }

  // ── Tools ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_tool_returns_201_with_defaults() {
    let app = app().await;
    let (status, body) = send(&app, "POST", "/tools", Some(tool_body("weather"))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "weather");
    assert_eq!(body["status"], "active");
    assert_eq!(body["is_public"], true);
    assert_eq!(body["requires_auth"], false);
    assert_eq!(body["usage_count"], 0);
    assert_eq!(body["version"], "1.0.0");
  }

  #[tokio::test]
  async fn duplicate_tool_returns_409() {
    let app = app().await;
    send(&app, "POST", "/tools", Some(tool_body("weather"))).await;
    let (status, body) = send(&app, "POST", "/tools", Some(tool_body("weather"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("weather"));
  }

  #[tokio::test]
  async fn tool_without_input_schema_is_rejected() {
    let app = app().await;
    let mut body = tool_body("weather");
    body.as_object_mut().unwrap().remove("input_schema");

    let (status, _) = send(&app, "POST", "/tools", Some(body)).await;
    assert!(status.is_client_error(), "status: {status}");
  }

  #[tokio::test]
  async fn get_tool_by_id_and_name() {
    let app = app().await;
    let (_, created) = send(&app, "POST", "/tools", Some(tool_body("weather"))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, by_id) = send(&app, "GET", &format!("/tools/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id, created);

    let (status, by_name) = send(&app, "GET", "/tools/by-name/weather", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_name["id"], id);

    let (status, _) = send(&app, "GET", "/tools/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn patch_tool_updates_fields_and_timestamp() {
    let app = app().await;
    let (_, created) = send(&app, "POST", "/tools", Some(tool_body("weather"))).await;
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = send(
      &app,
      "PATCH",
      &format!("/tools/{id}"),
      Some(json!({"status": "deprecated", "tags": ["legacy"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "deprecated");
    assert_eq!(updated["tags"], json!(["legacy"]));
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_ne!(updated["updated_at"], created["updated_at"]);
  }

  #[tokio::test]
  async fn list_tools_by_status() {
    let app = app().await;
    send(&app, "POST", "/tools", Some(tool_body("a"))).await;
    let mut archived = tool_body("b");
    archived["status"] = json!("archived");
    send(&app, "POST", "/tools", Some(archived)).await;

    let (status, all) = send(&app, "GET", "/tools", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, only) = send(&app, "GET", "/tools?status=archived", None).await;
    let only = only.as_array().unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0]["name"], "b");
  }

  #[tokio::test]
  async fn delete_tool_returns_204_then_404() {
    let app = app().await;
    let (_, created) = send(&app, "POST", "/tools", Some(tool_body("weather"))).await;
    let uri = format!("/tools/{}", created["id"]);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Bundles & policies ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn bundle_defaults_and_publish() {
    let app = app().await;
    let (status, created) = send(
      &app,
      "POST",
      "/bundles",
      Some(json!({"name": "travel", "display_name": "Travel", "description": "Trip tools"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["is_public"], true);
    assert_eq!(created["is_published"], false);
    assert_eq!(created["download_count"], 0);
    assert_eq!(created["star_count"], 0);
    assert!(created["published_at"].is_null());

    let (_, published) = send(
      &app,
      "PATCH",
      &format!("/bundles/{}", created["id"]),
      Some(json!({"is_published": true})),
    )
    .await;
    assert_eq!(published["is_published"], true);
    assert!(published["published_at"].is_string());
  }

  #[tokio::test]
  async fn policy_defaults() {
    let app = app().await;
    let (status, created) =
      send(&app, "POST", "/policies", Some(policy_body("quota", None))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["is_active"], true);
    assert_eq!(created["priority"], 0);
    assert_eq!(created["policy_type"], "usage_quota");
    assert_eq!(created["rules"], json!({"monthly": 1000}));
  }

  #[tokio::test]
  async fn patch_policy_with_null_detaches_bundle() {
    let app = app().await;
    let (_, bundle) = send(
      &app,
      "POST",
      "/bundles",
      Some(json!({"name": "travel", "display_name": "Travel", "description": "Trip tools"})),
    )
    .await;
    let (_, policy) =
      send(&app, "POST", "/policies", Some(policy_body("quota", bundle["id"].as_i64()))).await;
    let uri = format!("/policies/{}", policy["id"]);

    let (status, kept) = send(&app, "PATCH", &uri, Some(json!({"priority": 5}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kept["bundle_id"], bundle["id"]);

    let (status, cleared) = send(&app, "PATCH", &uri, Some(json!({"bundle_id": null}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["bundle_id"].is_null());
    assert_eq!(cleared["priority"], 5);
  }

  #[tokio::test]
  async fn policy_for_unknown_bundle_returns_400() {
    let app = app().await;
    let (status, _) =
      send(&app, "POST", "/policies", Some(policy_body("quota", Some(12)))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn deleting_bundle_removes_its_policies() {
    let app = app().await;
    let (_, bundle) = send(
      &app,
      "POST",
      "/bundles",
      Some(json!({"name": "travel", "display_name": "Travel", "description": "Trip tools"})),
    )
    .await;
    let bundle_id = bundle["id"].as_i64().unwrap();
    let (_, policy) =
      send(&app, "POST", "/policies", Some(policy_body("quota", Some(bundle_id)))).await;

    let (_, listed) =
      send(&app, "GET", &format!("/policies?bundle_id={bundle_id}"), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/bundles/{bundle_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/policies/{}", policy["id"]), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[test]
  fn openapi_lists_crud_paths() {
    let doc = ApiDoc::openapi();
    for path in ["/tools", "/tools/{id}", "/bundles/by-name/{name}", "/policies/{id}"] {
      assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }
  }
}
