// handlers/protected/courses.rs - /api/courses

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::Course;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathId, QueryParams};

/// GET /api/courses?branch_id&name&page&limit
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<Vec<Course>> {
    let page = query.page(&state.config.pagination)?;
    let courses = state
        .courses()
        .list(&principal, query.branch_id()?, query.text("name"), &page)
        .await?;
    Ok(ApiResponse::paginated(courses))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Course> {
    Ok(ApiResponse::success(state.courses().get(&principal, id, query.branch_id()?).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Course> {
    let course = state.courses().create(&principal, query.branch_id()?, &body).await?;
    Ok(ApiResponse::created(course).with_message("Course created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Course> {
    let course = state.courses().update(&principal, id, query.branch_id()?, &body).await?;
    Ok(ApiResponse::success(course).with_message("Course updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Value> {
    state.courses().delete(&principal, id, query.branch_id()?).await?;
    Ok(ApiResponse::success(json!({ "course_id": id })).with_message("Course deleted successfully"))
}
