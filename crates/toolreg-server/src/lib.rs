//! HTTP application shell for the tool registry.
//!
//! Wraps the `/api/v1` CRUD router from [`toolreg_api`] with CORS, request
//! tracing, health and welcome endpoints, and (in debug mode) interactive API
//! documentation. [`serve`] runs the whole lifecycle against a bound listener.

pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::Settings;

use std::{future::Future, sync::Arc};

use axum::{
  Json, Router,
  extract::State,
  http::HeaderValue,
  routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use toolreg_api::{ApiDoc, api_router};
use toolreg_core::store::RegistryStore;
use toolreg_store_sqlite::SqliteStore;
use tower_http::{
  cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
  trace::TraceLayer,
};
use utoipa::{
  OpenApi,
  openapi::{InfoBuilder, OpenApiBuilder},
};
use utoipa_scalar::{Scalar, Servable};

/// Mount point of the CRUD API.
pub const API_PREFIX: &str = "/api/v1";

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router over `store`.
///
/// Fails only when a configured CORS origin cannot be used.
pub fn router<S>(settings: Arc<Settings>, store: Arc<S>) -> Result<Router>
where
  S: RegistryStore + 'static,
{
  let cors = cors_layer(&settings.cors_origins)?;
  let debug = settings.debug;

  let mut app = Router::new()
    .route("/health", get(health))
    .route("/", get(root))
    .with_state(settings.clone())
    .nest(API_PREFIX, api_router(store));

  if debug {
    app = app.merge(docs_router(&settings));
  }

  Ok(app.layer(TraceLayer::new_for_http()).layer(cors))
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
  let origins = origins
    .iter()
    .map(|origin| {
      // `*` cannot be combined with credentials.
      if origin == "*" {
        return Err(Error::InvalidOrigin(origin.clone()));
      }
      HeaderValue::from_str(origin).map_err(|_| Error::InvalidOrigin(origin.clone()))
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(
    CorsLayer::new()
      .allow_origin(AllowOrigin::list(origins))
      .allow_methods(AllowMethods::mirror_request())
      .allow_headers(AllowHeaders::mirror_request())
      .allow_credentials(true),
  )
}

/// `/docs`, `/redoc` and `/openapi.json`, describing the API at its mount
/// point.
fn docs_router(settings: &Settings) -> Router {
  let doc = OpenApiBuilder::new()
    .info(
      InfoBuilder::new()
        .title(settings.app_name.clone())
        .version(settings.app_version.clone()),
    )
    .build()
    .nest(API_PREFIX, ApiDoc::openapi());

  let json = doc.clone();
  Router::new()
    .route(
      "/openapi.json",
      get(move || {
        let doc = json.clone();
        async move { Json(doc) }
      }),
    )
    .merge(Scalar::with_url("/docs", doc.clone()))
    .merge(Scalar::with_url("/redoc", doc))
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn health(State(settings): State<Arc<Settings>>) -> Json<Value> {
  Json(json!({
    "status":      "ok",
    "app":         settings.app_name,
    "version":     settings.app_version,
    "environment": settings.app_env,
  }))
}

async fn root(State(settings): State<Arc<Settings>>) -> Json<Value> {
  Json(json!({
    "message": format!("Welcome to {}", settings.app_name),
    "version": settings.app_version,
    "docs":    "/docs",
    "health":  "/health",
  }))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// Open the store, serve on `listener` until `shutdown` resolves, then close
/// the store. The store is closed on every path once it has been opened.
pub async fn serve<F>(settings: Settings, listener: TcpListener, shutdown: F) -> Result<()>
where
  F: Future<Output = ()> + Send + 'static,
{
  let settings = Arc::new(settings);
  tracing::info!(
    app = %settings.app_name,
    version = %settings.app_version,
    environment = %settings.app_env,
    database = %format_args!(
      "{}:{}/{}",
      settings.postgres_host, settings.postgres_port, settings.postgres_db
    ),
    store = %settings.store_path.display(),
    "starting"
  );
  let store = SqliteStore::open(&settings.store_path).await?;

  let served = async {
    let app = router(settings.clone(), Arc::new(store.clone()))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
      .with_graceful_shutdown(shutdown)
      .await?;
    Ok::<_, Error>(())
  }
  .await;

  let closed = store.close().await;
  served?;
  closed?;
  tracing::info!(app = %settings.app_name, "shut down");
  Ok(())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
  };
  use tower::ServiceExt as _;

  async fn app_with(settings: Settings) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(Arc::new(settings), Arc::new(store)).unwrap()
  }

  async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  // ── Health & root ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_reports_configured_identity() {
    let settings = Settings {
      app_name: "Registry".to_string(),
      app_version: "2.3.4".to_string(),
      app_env: "staging".to_string(),
      ..Settings::default()
    };
    let (status, body) = get_json(app_with(settings).await, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({
      "status": "ok",
      "app": "Registry",
      "version": "2.3.4",
      "environment": "staging"
    }));
  }

  #[tokio::test]
  async fn root_welcomes_and_links() {
    let (status, body) = get_json(app_with(Settings::default()).await, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to Tool Registry API");
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(body["docs"], "/docs");
    assert_eq!(body["health"], "/health");
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let (status, body) =
      get_json(app_with(Settings::default()).await, "/api/v1/tools").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
  }

  // ── Docs ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn docs_served_in_debug() {
    let app = app_with(Settings::default()).await;

    let (status, doc) = get_json(app.clone(), "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Tool Registry API");
    assert!(doc["paths"]["/api/v1/tools/{id}"].is_object());

    for uri in ["/docs", "/redoc"] {
      let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
      let resp = app.clone().oneshot(req).await.unwrap();
      assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
  }

  #[tokio::test]
  async fn docs_absent_without_debug() {
    let settings = Settings { debug: false, ..Settings::default() };
    let app = app_with(settings).await;

    for uri in ["/docs", "/redoc", "/openapi.json"] {
      let (status, _) = get_json(app.clone(), uri).await;
      assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
  }

  // ── CORS ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn preflight_from_allowed_origin() {
    let app = app_with(Settings::default()).await;
    let req = Request::builder()
      .method(Method::OPTIONS)
      .uri("/api/v1/tools")
      .header(header::ORIGIN, "http://localhost:3000")
      .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
      .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-custom")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let headers = resp.headers();

    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "DELETE");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-custom");
  }

  #[tokio::test]
  async fn other_origins_get_no_allow_header() {
    let app = app_with(Settings::default()).await;
    let req = Request::builder()
      .uri("/health")
      .header(header::ORIGIN, "https://evil.example")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
  }

  #[tokio::test]
  async fn unusable_origin_fails_router_build() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    for bad in ["*", "http://bad\norigin"] {
      let settings = Settings {
        cors_origins: vec![bad.to_string()],
        ..Settings::default()
      };
      let err = router(Arc::new(settings), store.clone()).unwrap_err();
      assert!(matches!(err, Error::InvalidOrigin(_)), "{err}");
    }
  }

  // ── Lifecycle ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn serve_stops_on_shutdown_signal() {
    let dir = std::env::temp_dir().join(format!("toolreg-serve-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let settings = Settings {
      store_path: dir.join("registry.db"),
      ..Settings::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

    serve(settings, listener, async {}).await.unwrap();
    assert!(dir.join("registry.db").exists());
    // A cleanly closed WAL database leaves no write-ahead log behind.
    assert!(!dir.join("registry.db-wal").exists());
    std::fs::remove_dir_all(&dir).ok();
  }

  #[tokio::test]
  async fn serve_closes_store_when_startup_fails() {
    let dir =
      std::env::temp_dir().join(format!("toolreg-serve-fail-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let settings = Settings {
      store_path: dir.join("registry.db"),
      cors_origins: vec!["*".to_string()],
      ..Settings::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let err = serve(settings, listener, async {}).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOrigin(_)), "{err}");
    assert!(dir.join("registry.db").exists());
    assert!(!dir.join("registry.db-wal").exists());
    std::fs::remove_dir_all(&dir).ok();
  }
}
