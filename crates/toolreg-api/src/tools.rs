//! Handlers for `/tools` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tools` | Optional `category`, `status`, `is_public`, `tag`, `limit`, `offset` |
//! | `POST`   | `/tools` | Body: [`NewTool`]; returns 201 + stored tool |
//! | `GET`    | `/tools/{id}` | 404 if not found |
//! | `GET`    | `/tools/by-name/{name}` | 404 if not found |
//! | `PATCH`  | `/tools/{id}` | Body: [`ToolUpdate`]; 409 on name collision |
//! | `DELETE` | `/tools/{id}` | 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use toolreg_core::{
  store::RegistryStore,
  tool::{NewTool, Tool, ToolQuery, ToolUpdate},
};

use crate::error::ApiError;

/// `GET /tools`
#[utoipa::path(
  get,
  path = "/tools",
  tag = "Tools",
  params(ToolQuery),
  responses((status = OK, description = "Matching tools ordered by id", body = Vec<Tool>)),
)]
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(query): Query<ToolQuery>,
) -> Result<Json<Vec<Tool>>, ApiError>
where
  S: RegistryStore,
{
  let tools = store.list_tools(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(tools))
}

/// `POST /tools`
#[utoipa::path(
  post,
  path = "/tools",
  tag = "Tools",
  request_body = NewTool,
  responses(
    (status = CREATED, description = "Tool registered", body = Tool),
    (status = CONFLICT, description = "A tool with this name exists"),
  ),
)]
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewTool>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let tool = store.create_tool(body).await.map_err(ApiError::from_store)?;
  tracing::info!(id = tool.id, name = %tool.name, "registered tool");
  Ok((StatusCode::CREATED, Json(tool)))
}

/// `GET /tools/{id}`
#[utoipa::path(
  get,
  path = "/tools/{id}",
  tag = "Tools",
  params(("id" = i64, Path, description = "Tool id")),
  responses(
    (status = OK, body = Tool),
    (status = NOT_FOUND, description = "No such tool"),
  ),
)]
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Tool>, ApiError>
where
  S: RegistryStore,
{
  let tool = store
    .get_tool(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("tool {id} not found")))?;
  Ok(Json(tool))
}

/// `GET /tools/by-name/{name}`
#[utoipa::path(
  get,
  path = "/tools/by-name/{name}",
  tag = "Tools",
  params(("name" = String, Path, description = "Unique tool name")),
  responses(
    (status = OK, body = Tool),
    (status = NOT_FOUND, description = "No such tool"),
  ),
)]
pub async fn get_by_name<S>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
) -> Result<Json<Tool>, ApiError>
where
  S: RegistryStore,
{
  let tool = store
    .get_tool_by_name(&name)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("tool {name:?} not found")))?;
  Ok(Json(tool))
}

/// `PATCH /tools/{id}`
#[utoipa::path(
  patch,
  path = "/tools/{id}",
  tag = "Tools",
  params(("id" = i64, Path, description = "Tool id")),
  request_body = ToolUpdate,
  responses(
    (status = OK, body = Tool),
    (status = NOT_FOUND, description = "No such tool"),
    (status = CONFLICT, description = "Another tool has this name"),
  ),
)]
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(body): Json<ToolUpdate>,
) -> Result<Json<Tool>, ApiError>
where
  S: RegistryStore,
{
  let tool = store.update_tool(id, body).await.map_err(ApiError::from_store)?;
  Ok(Json(tool))
}

/// `DELETE /tools/{id}`
#[utoipa::path(
  delete,
  path = "/tools/{id}",
  tag = "Tools",
  params(("id" = i64, Path, description = "Tool id")),
  responses(
    (status = NO_CONTENT, description = "Tool removed"),
    (status = NOT_FOUND, description = "No such tool"),
  ),
)]
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: RegistryStore,
{
  store.delete_tool(id).await.map_err(ApiError::from_store)?;
  tracing::info!(id, "removed tool");
  Ok(StatusCode::NO_CONTENT)
}
