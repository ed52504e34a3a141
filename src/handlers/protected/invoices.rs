// handlers/protected/invoices.rs - /api/invoices

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::Invoice;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathId, QueryParams};
use crate::services::invoice_service::InvoiceFilter;

/// GET /api/invoices?branch_id&status&student_id&page&limit
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<Vec<Invoice>> {
    let filter = InvoiceFilter {
        status: query.choice("status", r#"status must be "Pending", "Paid", or "Overdue""#)?,
        student_id: query.id("student_id")?,
    };
    let page = query.page(&state.config.pagination)?;
    let invoices = state
        .invoices()
        .list(&principal, query.branch_id()?, &filter, &page)
        .await?;
    Ok(ApiResponse::paginated(invoices))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Invoice> {
    Ok(ApiResponse::success(state.invoices().get(&principal, id, query.branch_id()?).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Invoice> {
    let invoice = state.invoices().create(&principal, query.branch_id()?, &body).await?;
    Ok(ApiResponse::created(invoice).with_message("Invoice created successfully"))
}

/// PUT /api/invoices/:id - Partial update; any of issue_date, due_date,
/// total_amount, discount_amount, status
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
    JsonBody(body): JsonBody,
) -> ApiResult<Invoice> {
    let invoice = state.invoices().update(&principal, id, query.branch_id()?, &body).await?;
    Ok(ApiResponse::success(invoice).with_message("Invoice updated successfully"))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> ApiResult<Value> {
    state.invoices().delete(&principal, id, query.branch_id()?).await?;
    Ok(ApiResponse::success(json!({ "invoice_id": id })).with_message("Invoice deleted successfully"))
}

/// GET /api/invoices/:id/download - Plain-text invoice as an attachment
pub async fn download(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    PathId(id): PathId,
    query: QueryParams,
) -> Result<Response, ApiError> {
    let document = state.invoices().download(&principal, id, query.branch_id()?).await?;
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", document.filename))
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.body,
    )
        .into_response())
}
