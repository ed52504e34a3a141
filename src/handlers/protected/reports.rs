// handlers/protected/reports.rs - Monthly payment aggregates

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::{BranchMonthlyTotal, StudentMonthlyTotal};
use crate::middleware::{ApiResponse, ApiResult, QueryParams};

/// GET /api/reports/monthly-branch-payments?branch_id&start_date&end_date
pub async fn monthly_branch(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<Vec<BranchMonthlyTotal>> {
    let rows = state
        .reports()
        .monthly_branch_payments(&principal, query.branch_id()?, query.range()?)
        .await?;
    let message = if rows.is_empty() {
        "No payments found"
    } else {
        "Monthly branch payments retrieved successfully"
    };
    Ok(ApiResponse::success(rows).with_message(message))
}

/// GET /api/reports/monthly-student-payments?branch_id&start_date&end_date
pub async fn monthly_student(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<Vec<StudentMonthlyTotal>> {
    let rows = state
        .reports()
        .monthly_student_payments(&principal, query.branch_id()?, query.range()?)
        .await?;
    let message = if rows.is_empty() {
        "No payments found"
    } else {
        "Monthly student payments retrieved successfully"
    };
    Ok(ApiResponse::success(rows).with_message(message))
}
