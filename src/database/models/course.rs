use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub course_id: i64,
    pub branch_id: i64,
    pub branch_name: String,
    pub course_name: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const COURSE_SELECT: &str = "SELECT co.course_id, co.branch_id, b.branch_name, co.course_name, co.price, \
     co.created_at, co.updated_at";

pub const COURSE_FROM: &str = "FROM courses co JOIN branches b ON b.branch_id = co.branch_id";
