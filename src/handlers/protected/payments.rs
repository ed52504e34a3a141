// handlers/protected/payments.rs - /api/payments

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::Payment;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathId, QueryParams};
use crate::services::payment_service::{PaymentFilter, PaymentSort};

/// GET /api/payments?branch_id&class_id&course_id&student_id&student_name&sort_by&page&limit
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<Vec<Payment>> {
    let filter = PaymentFilter {
        class_id: query.id("class_id")?,
        course_id: query.id("course_id")?,
        student_id: query.id("student_id")?,
        student_name: query.text("student_name").map(str::to_string),
        sort: PaymentSort::parse(query.text("sort_by")),
    };
    let page = query.page(&state.config.pagination)?;
    let payments = state
        .payments()
        .list(&principal, query.branch_id()?, &filter, &page)
        .await?;
    Ok(ApiResponse::paginated(payments))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Payment> {
    Ok(ApiResponse::success(state.payments().get(&principal, id, query.branch_id()?).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Payment> {
    let payment = state.payments().create(&principal, query.branch_id()?, &body).await?;
    Ok(ApiResponse::created(payment).with_message("Payment created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Payment> {
    let payment = state.payments().update(&principal, id, query.branch_id()?, &body).await?;
    Ok(ApiResponse::success(payment).with_message("Payment updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Value> {
    state.payments().delete(&principal, id, query.branch_id()?).await?;
    Ok(ApiResponse::success(json!({ "payment_id": id })).with_message("Payment deleted successfully"))
}
