use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgConnection, PgPool};

use super::{references, today, ServiceError, ServiceResult};
use crate::auth::Principal;
use crate::database::models::enrollment::{Enrollment, ENROLLMENT_FROM, ENROLLMENT_SELECT};
use crate::database::models::student::{Student, STUDENT_FROM, STUDENT_SELECT};
use crate::database::query_builder::{fetch_optional, fetch_page};
use crate::filter::{Filter, FilterOrder, Page, PageOf, SortDirection};
use crate::policy::{resolve_branch_scope, resolve_write_scope, BranchScope};
use crate::validation::enrollment::{validate_enrollment_update, validate_new_enrollment};

#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub class_id: Option<i64>,
    pub course_id: Option<i64>,
    pub student_name: Option<String>,
    pub room_number: Option<String>,
}

/// Result of create-and-enroll
#[derive(Debug, Serialize)]
pub struct EnrolledStudent {
    pub student: Student,
    pub enrollment: Option<Enrollment>,
}

pub struct EnrollmentService {
    pool: PgPool,
}

impl EnrollmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        branch_id: Option<i64>,
        params: &EnrollmentFilter,
        page: &Page,
    ) -> ServiceResult<PageOf<Enrollment>> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(ENROLLMENT_SELECT, ENROLLMENT_FROM)
            .order(FilterOrder::desc("e.enrollment_date").then("e.enrollment_id", SortDirection::Desc));
        filter
            .conditions()
            .scope("s.branch_id", &scope)
            .eq_opt("e.class_id", params.class_id)
            .eq_opt("e.course_id", params.course_id)
            .contains_any(&["s.first_name", "s.last_name"], params.student_name.as_deref())
            .contains_any(&["c.room_number"], params.room_number.as_deref());
        Ok(fetch_page(&self.pool, &filter, page).await?)
    }

    pub async fn get(&self, principal: &Principal, enrollment_id: i64, branch_id: Option<i64>) -> ServiceResult<Enrollment> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        self.find(enrollment_id, &scope).await
    }

    /// Inserts the student and, when a class or course is given, the enrollment,
    /// in one transaction.
    pub async fn create(
        &self,
        principal: &Principal,
        branch_id: Option<i64>,
        body: &Value,
    ) -> ServiceResult<EnrolledStudent> {
        let today = today();
        let input = validate_new_enrollment(body, today)?;
        let branch_id = resolve_write_scope(principal, input.student.branch_id, branch_id)?.require()?;

        let mut tx = self.pool.begin().await?;
        references::ensure_branch(&mut *tx, branch_id).await?;
        check_targets(&mut *tx, input.class_id, input.course_id, branch_id).await?;

        let profile = &input.student.profile;
        let student_id: i64 = sqlx::query_scalar(
            "INSERT INTO students (branch_id, first_name, last_name, dob, gender) \
             VALUES ($1, $2, $3, $4, $5) RETURNING student_id",
        )
        .bind(branch_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.dob)
        .bind(profile.gender.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let enrollment_id = if input.enrolls() {
            let enrollment_date: NaiveDate = input.enrollment_date.unwrap_or(today);
            let enrollment_id: i64 = sqlx::query_scalar(
                "INSERT INTO enrollments (student_id, class_id, course_id, enrollment_date) \
                 VALUES ($1, $2, $3, $4) RETURNING enrollment_id",
            )
            .bind(student_id)
            .bind(input.class_id)
            .bind(input.course_id)
            .bind(enrollment_date)
            .fetch_one(&mut *tx)
            .await?;
            Some(enrollment_id)
        } else {
            None
        };

        tx.commit().await?;
        tracing::info!(
            "Created student {} in branch {} with enrollment {:?}",
            student_id,
            branch_id,
            enrollment_id
        );

        let scope = BranchScope::Branch(branch_id);
        let student = self.find_student(student_id, &scope).await?;
        let enrollment = match enrollment_id {
            Some(id) => Some(self.find(id, &scope).await?),
            None => None,
        };
        Ok(EnrolledStudent { student, enrollment })
    }

    /// Updates the student's demographics and the enrollment's class/course together
    pub async fn update(
        &self,
        principal: &Principal,
        enrollment_id: i64,
        branch_id: Option<i64>,
        body: &Value,
    ) -> ServiceResult<Enrollment> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let input = validate_enrollment_update(body, today())?;

        let mut tx = self.pool.begin().await?;
        let (student_id, student_branch) = lock_enrollment(&mut *tx, enrollment_id, &scope).await?;
        check_targets(&mut *tx, input.class_id, input.course_id, student_branch).await?;

        let profile = &input.profile;
        sqlx::query(
            "UPDATE students SET first_name = $1, last_name = $2, dob = $3, gender = $4, updated_at = now() \
             WHERE student_id = $5",
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.dob)
        .bind(profile.gender.as_str())
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE enrollments SET class_id = COALESCE($1, class_id), course_id = COALESCE($2, course_id) \
             WHERE enrollment_id = $3",
        )
        .bind(input.class_id)
        .bind(input.course_id)
        .bind(enrollment_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Updated enrollment {} and student {}", enrollment_id, student_id);
        self.find(enrollment_id, &scope).await
    }

    /// Removes the enrollment and the student it belongs to
    pub async fn delete(&self, principal: &Principal, enrollment_id: i64, branch_id: Option<i64>) -> ServiceResult<()> {
        let scope = resolve_branch_scope(principal, branch_id)?;

        let mut tx = self.pool.begin().await?;
        let (student_id, _) = lock_enrollment(&mut *tx, enrollment_id, &scope).await?;

        sqlx::query("DELETE FROM enrollments WHERE enrollment_id = $1")
            .bind(enrollment_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM students WHERE student_id = $1")
            .bind(student_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Deleted enrollment {} and student {}", enrollment_id, student_id);
        Ok(())
    }

    async fn find(&self, enrollment_id: i64, scope: &BranchScope) -> ServiceResult<Enrollment> {
        let mut filter = Filter::new(ENROLLMENT_SELECT, ENROLLMENT_FROM);
        filter.conditions().eq("e.enrollment_id", enrollment_id).scope("s.branch_id", scope);
        fetch_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| ServiceError::not_found("Enrollment not found."))
    }

    async fn find_student(&self, student_id: i64, scope: &BranchScope) -> ServiceResult<Student> {
        let mut filter = Filter::new(STUDENT_SELECT, STUDENT_FROM);
        filter.conditions().eq("s.student_id", student_id).scope("s.branch_id", scope);
        fetch_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| ServiceError::not_found("Student not found"))
    }
}

/// Class and course must both live in the student's branch
async fn check_targets(
    conn: &mut PgConnection,
    class_id: Option<i64>,
    course_id: Option<i64>,
    branch_id: i64,
) -> ServiceResult<()> {
    if let Some(class_id) = class_id {
        references::ensure_class_in_branch(&mut *conn, class_id, branch_id).await?;
    }
    if let Some(course_id) = course_id {
        references::course_in_branch(&mut *conn, course_id, branch_id).await?;
    }
    Ok(())
}

/// Locks the enrollment row for the rest of the transaction. Returns its student and branch.
async fn lock_enrollment(conn: &mut PgConnection, enrollment_id: i64, scope: &BranchScope) -> ServiceResult<(i64, i64)> {
    let row: Option<(i64, i64)> = sqlx::query_as(
        "SELECT e.student_id, s.branch_id FROM enrollments e JOIN students s ON s.student_id = e.student_id \
         WHERE e.enrollment_id = $1 AND ($2::BIGINT IS NULL OR s.branch_id = $2) FOR UPDATE OF e",
    )
    .bind(enrollment_id)
    .bind(scope.branch_id())
    .fetch_optional(&mut *conn)
    .await?;
    row.ok_or_else(|| ServiceError::not_found("Enrollment not found."))
}
