// handlers/protected/students.rs - /api/students
//
// Two removal paths: PUT /:id/deactivate keeps the row and clears `is_active`,
// DELETE /:id purges the student together with its enrollments, payments and
// invoices.

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::Student;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathId, QueryParams};
use crate::services::student_service::StudentFilter;

/// GET /api/students?branch_id&name&is_active&page&limit
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<Vec<Student>> {
    let filter = StudentFilter {
        name: query.text("name").map(str::to_string),
        is_active: query.flag("is_active")?,
    };
    let page = query.page(&state.config.pagination)?;
    let students = state
        .students()
        .list(&principal, query.branch_id()?, &filter, &page)
        .await?;
    Ok(ApiResponse::paginated(students))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Student> {
    let student = state.students().get(&principal, id, query.branch_id()?).await?;
    Ok(ApiResponse::success(student))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Student> {
    let student = state.students().create(&principal, query.branch_id()?, &body).await?;
    Ok(ApiResponse::created(student).with_message("Student created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Student> {
    let student = state
        .students()
        .update(&principal, id, query.branch_id()?, &body)
        .await?;
    Ok(ApiResponse::success(student).with_message("Student updated successfully"))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Student> {
    let student = state.students().deactivate(&principal, id, query.branch_id()?).await?;
    Ok(ApiResponse::success(student).with_message("Student deactivated successfully"))
}

pub async fn purge(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Value> {
    state.students().purge(&principal, id, query.branch_id()?).await?;
    Ok(ApiResponse::success(json!({ "student_id": id })).with_message("Student deleted successfully"))
}
