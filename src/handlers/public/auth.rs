// handlers/public/auth.rs - POST /api/auth/login

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::services::auth_service::LoginResponse;

/**
 * POST /api/auth/login - Exchange username and password for a session token
 *
 * Expected Input:
 * ```json
 * { "username": "string", "password": "string" }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "status": "success",
 *   "message": "Login successful",
 *   "data": {
 *     "token": "eyJhbGciOiJIUzI1NiI...",
 *     "user": { "user_id": 1, "username": "admin", "role": "Admin", "branch_id": null }
 *   }
 * }
 * ```
 *
 * Errors: 400 when either field is missing, 401 for an unknown user or a
 * wrong password.
 */
pub async fn login(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<LoginResponse> {
    let session = state.auth().login(&body).await?;
    Ok(ApiResponse::success(session).with_message("Login successful"))
}
