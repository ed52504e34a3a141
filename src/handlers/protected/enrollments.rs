// handlers/protected/enrollments.rs - /api/enrollments
//
// Creating an enrollment creates the student as well, and deleting one removes
// the student. Both run in a single transaction in the service.

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::Enrollment;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathId, QueryParams};
use crate::services::enrollment_service::{EnrolledStudent, EnrollmentFilter};

/// GET /api/enrollments?branch_id&class_id&course_id&student_name&room_number&page&limit
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<Vec<Enrollment>> {
    let filter = EnrollmentFilter {
        class_id: query.id("class_id")?,
        course_id: query.id("course_id")?,
        student_name: query.text("student_name").map(str::to_string),
        room_number: query.text("room_number").map(str::to_string),
    };
    let page = query.page(&state.config.pagination)?;
    let enrollments = state
        .enrollments()
        .list(&principal, query.branch_id()?, &filter, &page)
        .await?;
    Ok(ApiResponse::paginated(enrollments))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Enrollment> {
    Ok(ApiResponse::success(state.enrollments().get(&principal, id, query.branch_id()?).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<EnrolledStudent> {
    let enrolled = state.enrollments().create(&principal, query.branch_id()?, &body).await?;
    let message = if enrolled.enrollment.is_some() {
        "Student created and enrolled successfully"
    } else {
        "Student created successfully"
    };
    Ok(ApiResponse::created(enrolled).with_message(message))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Enrollment> {
    let enrollment = state
        .enrollments()
        .update(&principal, id, query.branch_id()?, &body)
        .await?;
    Ok(ApiResponse::success(enrollment).with_message("Enrollment updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Value> {
    state.enrollments().delete(&principal, id, query.branch_id()?).await?;
    Ok(ApiResponse::success(json!({ "enrollment_id": id }))
        .with_message("Enrollment and associated student deleted successfully"))
}
