// handlers/protected/users.rs - /api/users

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathId, QueryParams};

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<Vec<User>> {
    let users = state.users().list(&principal, query.branch_id()?).await?;
    Ok(ApiResponse::success(users))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<User> {
    let user = state.users().get(&principal, id, query.branch_id()?).await?;
    Ok(ApiResponse::success(user))
}

pub async fn create(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<User> {
    let user = state.users().create(&body).await?;
    Ok(ApiResponse::created(user).with_message("User created successfully"))
}

pub async fn update(State(state): State<AppState>, PathId(id): PathId, JsonBody(body): JsonBody) -> ApiResult<User> {
    let user = state.users().update(id, &body).await?;
    Ok(ApiResponse::success(user).with_message("User updated successfully"))
}

pub async fn delete(State(state): State<AppState>, PathId(id): PathId) -> ApiResult<Value> {
    state.users().delete(id).await?;
    Ok(ApiResponse::success(json!({ "user_id": id })).with_message("User deleted successfully"))
}

/// PUT /api/users/:id/change-password - `{"newPassword": "..."}`
pub async fn change_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    state.users().change_password(&principal, id, &body).await?;
    Ok(ApiResponse::success(json!({ "user_id": id })).with_message("Password updated successfully"))
}
