// handlers/protected/dashboard.rs - GET /api/dashboard

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::DashboardSummary;
use crate::middleware::{ApiResponse, ApiResult, QueryParams};

pub async fn summary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: QueryParams,
) -> ApiResult<DashboardSummary> {
    let summary = state.dashboard().summary(&principal, query.branch_id()?).await?;
    Ok(ApiResponse::success(summary))
}
