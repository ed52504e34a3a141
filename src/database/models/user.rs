use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::types::Role;

/// User as exposed over the API; the password hash is never selected
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub branch_id: Option<i64>,
    pub branch_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const USER_SELECT: &str = "SELECT u.user_id, u.username, u.role, u.branch_id, b.branch_name, \
     u.created_at, u.updated_at";

pub const USER_FROM: &str = "FROM users u LEFT JOIN branches b ON b.branch_id = u.branch_id";
