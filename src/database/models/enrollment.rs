use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use crate::types::Gender;

/// Enrollment with the student, class and course it links
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Enrollment {
    pub enrollment_id: i64,
    pub enrollment_date: NaiveDate,
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub is_active: bool,
    pub branch_id: i64,
    pub branch_name: String,
    pub class_id: Option<i64>,
    pub book: Option<String>,
    pub room_number: Option<String>,
    pub course_id: Option<i64>,
    pub course_name: Option<String>,
}

pub const ENROLLMENT_SELECT: &str = "SELECT e.enrollment_id, e.enrollment_date, s.student_id, s.first_name, \
     s.last_name, s.dob, s.gender, s.is_active, s.branch_id, b.branch_name, e.class_id, c.book, \
     c.room_number, e.course_id, co.course_name";

pub const ENROLLMENT_FROM: &str = "FROM enrollments e \
     JOIN students s ON s.student_id = e.student_id \
     JOIN branches b ON b.branch_id = s.branch_id \
     LEFT JOIN classes c ON c.class_id = e.class_id \
     LEFT JOIN courses co ON co.course_id = e.course_id";
