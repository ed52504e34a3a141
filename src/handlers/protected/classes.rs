// handlers/protected/classes.rs - /api/classes

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::Class;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathId, QueryParams};
use crate::services::class_service::ClassFilter;

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<Vec<Class>> {
    let filter = ClassFilter {
        room_number: query.text("room_number").map(str::to_string),
        book: query.text("book").map(str::to_string),
    };
    let page = query.page(&state.config.pagination)?;
    let classes = state.classes().list(&principal, query.branch_id()?, &filter, &page).await?;
    Ok(ApiResponse::paginated(classes))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Class> {
    Ok(ApiResponse::success(state.classes().get(&principal, id, query.branch_id()?).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Class> {
    let class = state.classes().create(&principal, query.branch_id()?, &body).await?;
    Ok(ApiResponse::created(class).with_message("Class created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Class> {
    let class = state.classes().update(&principal, id, query.branch_id()?, &body).await?;
    Ok(ApiResponse::success(class).with_message("Class updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Value> {
    state.classes().delete(&principal, id, query.branch_id()?).await?;
    Ok(ApiResponse::success(json!({ "class_id": id })).with_message("Class deleted successfully"))
}
