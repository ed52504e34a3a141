//! Foreign-key checks scoped to a branch.
//!
//! A reference that exists in another branch is reported as invalid, never as
//! found, so object ids reveal nothing about other branches. All helpers take
//! any executor so they run on the pool or inside an open transaction.

use rust_decimal::Decimal;
use sqlx::PgExecutor;

use super::{ServiceError, ServiceResult};

fn invalid(message: &str) -> ServiceError {
    ServiceError::invalid(message)
}

pub async fn ensure_branch<'e, E: PgExecutor<'e>>(exec: E, branch_id: i64) -> ServiceResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM branches WHERE branch_id = $1)")
        .bind(branch_id)
        .fetch_one(exec)
        .await?;
    if !exists {
        return Err(invalid("Invalid branch_id"));
    }
    Ok(())
}

pub async fn ensure_student_in_branch<'e, E: PgExecutor<'e>>(exec: E, student_id: i64, branch_id: i64) -> ServiceResult<()> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM students WHERE student_id = $1 AND branch_id = $2)",
    )
    .bind(student_id)
    .bind(branch_id)
    .fetch_one(exec)
    .await?;
    if !exists {
        return Err(invalid("Invalid student_id: Student does not exist in this branch"));
    }
    Ok(())
}

pub async fn ensure_class_in_branch<'e, E: PgExecutor<'e>>(exec: E, class_id: i64, branch_id: i64) -> ServiceResult<()> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM classes WHERE class_id = $1 AND branch_id = $2)",
    )
    .bind(class_id)
    .bind(branch_id)
    .fetch_one(exec)
    .await?;
    if !exists {
        return Err(invalid("Invalid class_id: Class does not exist in this branch"));
    }
    Ok(())
}

/// Returns the course price
pub async fn course_in_branch<'e, E: PgExecutor<'e>>(exec: E, course_id: i64, branch_id: i64) -> ServiceResult<Decimal> {
    let price: Option<Decimal> = sqlx::query_scalar("SELECT price FROM courses WHERE course_id = $1 AND branch_id = $2")
        .bind(course_id)
        .bind(branch_id)
        .fetch_optional(exec)
        .await?;
    price.ok_or_else(|| invalid("Invalid course_id: Course does not exist in this branch"))
}

/// The payment must belong to both the student and the branch. Returns its course, if any.
pub async fn payment_for_student<'e, E: PgExecutor<'e>>(
    exec: E,
    payment_id: i64,
    branch_id: i64,
    student_id: i64,
) -> ServiceResult<Option<i64>> {
    let row: Option<(Option<i64>,)> = sqlx::query_as(
        "SELECT course_id FROM payments WHERE payment_id = $1 AND branch_id = $2 AND student_id = $3",
    )
    .bind(payment_id)
    .bind(branch_id)
    .bind(student_id)
    .fetch_optional(exec)
    .await?;
    row.map(|(course_id,)| course_id)
        .ok_or_else(|| invalid("Invalid payment_id: Payment does not exist for this student and branch"))
}

/// An enrollment row links them and the student has not been deactivated
pub async fn ensure_active_enrollment<'e, E: PgExecutor<'e>>(exec: E, student_id: i64, course_id: i64) -> ServiceResult<()> {
    let enrolled: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM enrollments e JOIN students s ON s.student_id = e.student_id \
         WHERE e.student_id = $1 AND e.course_id = $2 AND s.is_active)",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(exec)
    .await?;
    if !enrolled {
        return Err(invalid(
            "Invalid enrollment: Student is not enrolled in the course associated with this payment",
        ));
    }
    Ok(())
}

/// Whether an enrollment or payment still points at the class or course.
/// `column` is `class_id` or `course_id`.
pub async fn billing_references<'e, E: PgExecutor<'e>>(exec: E, column: &'static str, id: i64) -> ServiceResult<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM enrollments WHERE {0} = $1) OR EXISTS(SELECT 1 FROM payments WHERE {0} = $1)",
        column
    );
    Ok(sqlx::query_scalar(&sql).bind(id).fetch_one(exec).await?)
}
