use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Class {
    pub class_id: i64,
    pub branch_id: i64,
    pub branch_name: String,
    pub book: String,
    pub room_number: Option<String>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const CLASS_SELECT: &str = "SELECT c.class_id, c.branch_id, b.branch_name, c.book, c.room_number, c.price, \
     c.created_at, c.updated_at";

pub const CLASS_FROM: &str = "FROM classes c JOIN branches b ON b.branch_id = c.branch_id";
