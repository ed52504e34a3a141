use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Branch {
    pub branch_id: i64,
    pub branch_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const BRANCH_SELECT: &str = "SELECT branch_id, branch_name, phone, address, created_at, updated_at";

pub const BRANCH_FROM: &str = "FROM branches";
