// handlers/public/mod.rs - Endpoints reachable without a token

pub mod auth;

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "status": "success",
        "data": {
            "name": "School Admin API",
            "version": version,
            "endpoints": {
                "health": "/health (public)",
                "login": "/api/auth/login (public)",
                "auth": "/api/auth/register, /api/auth/logout, /api/auth/me",
                "resources": "/api/branches, /api/users, /api/students, /api/classes, /api/courses, \
                              /api/enrollments, /api/payments, /api/invoices",
                "reports": "/api/reports/*, /api/dashboard"
            }
        }
    }))
}

/// Liveness: always 200, database status reported in the body
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.db.health_check().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            "unavailable"
        }
    };

    Json(json!({
        "status": "success",
        "data": {
            "status": "ok",
            "database": database,
            "timestamp": chrono::Utc::now()
        }
    }))
}
