use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub payment_id: i64,
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub class_id: Option<i64>,
    pub book: Option<String>,
    pub course_id: Option<i64>,
    pub course_name: Option<String>,
    pub branch_id: i64,
    pub branch_name: String,
    pub original_amount: Decimal,
    pub discount_amount: Decimal,
    pub discount_percentage: Decimal,
    pub amount: Decimal,
    pub payment_period_type: String,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_date: NaiveDate,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const PAYMENT_SELECT: &str = "SELECT p.payment_id, p.student_id, s.first_name, s.last_name, p.class_id, \
     c.book, p.course_id, co.course_name, p.branch_id, b.branch_name, p.original_amount, \
     p.discount_amount, p.discount_percentage, p.amount, p.payment_period_type, p.issue_date, \
     p.due_date, p.payment_date, p.description, p.status, p.created_at, p.updated_at";

pub const PAYMENT_FROM: &str = "FROM payments p \
     JOIN students s ON s.student_id = p.student_id \
     JOIN branches b ON b.branch_id = p.branch_id \
     LEFT JOIN classes c ON c.class_id = p.class_id \
     LEFT JOIN courses co ON co.course_id = p.course_id";
