//! Handlers for `/policies` endpoints.
//!
//! Rules are accepted and returned verbatim; nothing here evaluates them.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/policies` | Optional `policy_type`, `scope`, `bundle_id`, `is_active`, `limit`, `offset` |
//! | `POST`   | `/policies` | Body: [`NewPolicy`]; 400 if `bundle_id` names no bundle |
//! | `GET`    | `/policies/{id}` | 404 if not found |
//! | `GET`    | `/policies/by-name/{name}` | 404 if not found |
//! | `PATCH`  | `/policies/{id}` | Body: [`PolicyUpdate`] |
//! | `DELETE` | `/policies/{id}` | 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use toolreg_core::{
  store::RegistryStore,
  policy::{NewPolicy, Policy, PolicyQuery, PolicyUpdate},
};

use crate::error::ApiError;

/// `GET /policies`
#[utoipa::path(
  get,
  path = "/policies",
  tag = "Policies",
  params(PolicyQuery),
  responses((status = OK, description = "Matching policies ordered by id", body = Vec<Policy>)),
)]
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(query): Query<PolicyQuery>,
) -> Result<Json<Vec<Policy>>, ApiError>
where
  S: RegistryStore,
{
  let policies = store.list_policies(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(policies))
}

/// `POST /policies`
#[utoipa::path(
  post,
  path = "/policies",
  tag = "Policies",
  request_body = NewPolicy,
  responses(
    (status = CREATED, description = "Policy created", body = Policy),
    (status = CONFLICT, description = "A policy with this name exists"),
    (status = BAD_REQUEST, description = "bundle_id names no bundle"),
  ),
)]
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewPolicy>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let policy = store.create_policy(body).await.map_err(ApiError::from_store)?;
  tracing::info!(id = policy.id, name = %policy.name, "created policy");
  Ok((StatusCode::CREATED, Json(policy)))
}

/// `GET /policies/{id}`
#[utoipa::path(
  get,
  path = "/policies/{id}",
  tag = "Policies",
  params(("id" = i64, Path, description = "Policy id")),
  responses(
    (status = OK, body = Policy),
    (status = NOT_FOUND, description = "No such policy"),
  ),
)]
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Policy>, ApiError>
where
  S: RegistryStore,
{
  let policy = store
    .get_policy(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("policy {id} not found")))?;
  Ok(Json(policy))
}

/// `GET /policies/by-name/{name}`
#[utoipa::path(
  get,
  path = "/policies/by-name/{name}",
  tag = "Policies",
  params(("name" = String, Path, description = "Unique policy name")),
  responses(
    (status = OK, body = Policy),
    (status = NOT_FOUND, description = "No such policy"),
  ),
)]
pub async fn get_by_name<S>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
) -> Result<Json<Policy>, ApiError>
where
  S: RegistryStore,
{
  let policy = store
    .get_policy_by_name(&name)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("policy {name:?} not found")))?;
  Ok(Json(policy))
}

/// `PATCH /policies/{id}`
#[utoipa::path(
  patch,
  path = "/policies/{id}",
  tag = "Policies",
  params(("id" = i64, Path, description = "Policy id")),
  request_body = PolicyUpdate,
  responses(
    (status = OK, body = Policy),
    (status = NOT_FOUND, description = "No such policy"),
    (status = CONFLICT, description = "Another policy has this name"),
  ),
)]
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(body): Json<PolicyUpdate>,
) -> Result<Json<Policy>, ApiError>
where
  S: RegistryStore,
{
  let policy = store.update_policy(id, body).await.map_err(ApiError::from_store)?;
  Ok(Json(policy))
}

/// `DELETE /policies/{id}`
#[utoipa::path(
  delete,
  path = "/policies/{id}",
  tag = "Policies",
  params(("id" = i64, Path, description = "Policy id")),
  responses(
    (status = NO_CONTENT, description = "Policy removed"),
    (status = NOT_FOUND, description = "No such policy"),
  ),
)]
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: RegistryStore,
{
  store.delete_policy(id).await.map_err(ApiError::from_store)?;
  tracing::info!(id, "removed policy");
  Ok(StatusCode::NO_CONTENT)
}
