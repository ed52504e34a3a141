// handlers/protected/branches.rs - /api/branches

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::Branch;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathId, QueryParams};

/// GET /api/branches - Every branch for Admins, the assigned one for Accountants
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<Vec<Branch>> {
    Ok(ApiResponse::success(state.branches().list(&principal, query.branch_id()?).await?))
}

/// GET /api/branches/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Branch> {
    Ok(ApiResponse::success(state.branches().get(&principal, id, query.branch_id()?).await?))
}

/// POST /api/branches
pub async fn create(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<Branch> {
    let branch = state.branches().create(&body).await?;
    Ok(ApiResponse::created(branch).with_message("Branch created successfully"))
}

/// PUT /api/branches/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    JsonBody(body): JsonBody,
) -> ApiResult<Branch> {
    let branch = state.branches().update(&principal, id, &body).await?;
    Ok(ApiResponse::success(branch).with_message("Branch updated successfully"))
}

/// DELETE /api/branches/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
) -> ApiResult<Value> {
    state.branches().delete(&principal, id).await?;
    Ok(ApiResponse::success(json!({ "branch_id": id })).with_message("Branch deleted successfully"))
}
