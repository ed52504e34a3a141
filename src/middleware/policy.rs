use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::Principal;
use crate::error::ApiError;
use crate::policy;

/// Checks the route table for the matched route before the handler runs.
/// Sits inside `require_auth`, so a principal is always present.
pub async fn authorize_route(request: Request, next: Next) -> Result<Response, ApiError> {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let principal = request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    policy::authorize_route(principal, request.method().as_str(), &path)?;
    Ok(next.run(request).await)
}
