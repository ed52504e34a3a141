use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::types::Gender;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub student_id: i64,
    pub branch_id: i64,
    pub branch_name: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const STUDENT_SELECT: &str = "SELECT s.student_id, s.branch_id, b.branch_name, s.first_name, s.last_name, \
     s.dob, s.gender, s.is_active, s.created_at, s.updated_at";

pub const STUDENT_FROM: &str = "FROM students s JOIN branches b ON b.branch_id = s.branch_id";
