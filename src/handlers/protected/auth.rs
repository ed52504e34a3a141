// handlers/protected/auth.rs - Session endpoints for authenticated callers

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};

/// POST /api/auth/register - Admin creates a user; same rules as POST /api/users
pub async fn register(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<User> {
    let user = state.users().create(&body).await?;
    Ok(ApiResponse::created(user).with_message("User registered successfully"))
}

/// POST /api/auth/logout - Tokens are stateless; the client discards its copy
pub async fn logout(Extension(principal): Extension<Principal>) -> ApiResult<Value> {
    tracing::info!("User {} logged out", principal.user_id);
    Ok(ApiResponse::success(json!(null)).with_message("Logged out. Discard the token on the client."))
}

/// GET /api/auth/me - Caller identity as currently stored
pub async fn me(Extension(principal): Extension<Principal>) -> ApiResult<Principal> {
    Ok(ApiResponse::success(principal))
}
