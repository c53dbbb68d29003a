//! Handlers for `/bundles` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/bundles` | Optional `category`, `is_public`, `is_published`, `tag`, `limit`, `offset` |
//! | `POST`   | `/bundles` | Body: [`NewBundle`]; returns 201 + stored bundle |
//! | `GET`    | `/bundles/{id}` | 404 if not found |
//! | `GET`    | `/bundles/by-name/{name}` | 404 if not found |
//! | `PATCH`  | `/bundles/{id}` | Body: [`BundleUpdate`]; `is_published` drives `published_at` |
//! | `DELETE` | `/bundles/{id}` | 204; the bundle's policies are deleted with it |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use toolreg_core::{
  store::RegistryStore,
  bundle::{Bundle, BundleQuery, BundleUpdate, NewBundle},
};

use crate::error::ApiError;

/// `GET /bundles`
#[utoipa::path(
  get,
  path = "/bundles",
  tag = "Bundles",
  params(BundleQuery),
  responses((status = OK, description = "Matching bundles ordered by id", body = Vec<Bundle>)),
)]
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(query): Query<BundleQuery>,
) -> Result<Json<Vec<Bundle>>, ApiError>
where
  S: RegistryStore,
{
  let bundles = store.list_bundles(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(bundles))
}

/// `POST /bundles`
#[utoipa::path(
  post,
  path = "/bundles",
  tag = "Bundles",
  request_body = NewBundle,
  responses(
    (status = CREATED, description = "Bundle created", body = Bundle),
    (status = CONFLICT, description = "A bundle with this name exists"),
  ),
)]
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewBundle>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let bundle = store.create_bundle(body).await.map_err(ApiError::from_store)?;
  tracing::info!(id = bundle.id, name = %bundle.name, "created bundle");
  Ok((StatusCode::CREATED, Json(bundle)))
}

/// `GET /bundles/{id}`
#[utoipa::path(
  get,
  path = "/bundles/{id}",
  tag = "Bundles",
  params(("id" = i64, Path, description = "Bundle id")),
  responses(
    (status = OK, body = Bundle),
    (status = NOT_FOUND, description = "No such bundle"),
  ),
)]
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Bundle>, ApiError>
where
  S: RegistryStore,
{
  let bundle = store
    .get_bundle(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("bundle {id} not found")))?;
  Ok(Json(bundle))
}

/// `GET /bundles/by-name/{name}`
#[utoipa::path(
  get,
  path = "/bundles/by-name/{name}",
  tag = "Bundles",
  params(("name" = String, Path, description = "Unique bundle name")),
  responses(
    (status = OK, body = Bundle),
    (status = NOT_FOUND, description = "No such bundle"),
  ),
)]
pub async fn get_by_name<S>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
) -> Result<Json<Bundle>, ApiError>
where
  S: RegistryStore,
{
  let bundle = store
    .get_bundle_by_name(&name)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("bundle {name:?} not found")))?;
  Ok(Json(bundle))
}

/// `PATCH /bundles/{id}`
#[utoipa::path(
  patch,
  path = "/bundles/{id}",
  tag = "Bundles",
  params(("id" = i64, Path, description = "Bundle id")),
  request_body = BundleUpdate,
  responses(
    (status = OK, body = Bundle),
    (status = NOT_FOUND, description = "No such bundle"),
    (status = CONFLICT, description = "Another bundle has this name"),
  ),
)]
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(body): Json<BundleUpdate>,
) -> Result<Json<Bundle>, ApiError>
where
  S: RegistryStore,
{
  let bundle = store.update_bundle(id, body).await.map_err(ApiError::from_store)?;
  Ok(Json(bundle))
}

/// `DELETE /bundles/{id}`
#[utoipa::path(
  delete,
  path = "/bundles/{id}",
  tag = "Bundles",
  params(("id" = i64, Path, description = "Bundle id")),
  responses(
    (status = NO_CONTENT, description = "Bundle and its policies removed"),
    (status = NOT_FOUND, description = "No such bundle"),
  ),
)]
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: RegistryStore,
{
  store.delete_bundle(id).await.map_err(ApiError::from_store)?;
  tracing::info!(id, "removed bundle");
  Ok(StatusCode::NO_CONTENT)
}
