use serde_json::Value;
use sqlx::PgPool;

use super::{expect_affected, references, today, ServiceError, ServiceResult};
use crate::auth::Principal;
use crate::database::models::student::{Student, STUDENT_FROM, STUDENT_SELECT};
use crate::database::query_builder::{fetch_optional, fetch_page};
use crate::filter::{Filter, FilterOrder, Page, PageOf, SortDirection};
use crate::policy::{resolve_branch_scope, resolve_write_scope, BranchScope};
use crate::validation::student::{validate_new_student, validate_student_update};

/// Optional list filters
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// Substring of first or last name
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

pub struct StudentService {
    pool: PgPool,
}

impl StudentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        branch_id: Option<i64>,
        params: &StudentFilter,
        page: &Page,
    ) -> ServiceResult<PageOf<Student>> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(STUDENT_SELECT, STUDENT_FROM)
            .order(FilterOrder::asc("s.last_name").then("s.student_id", SortDirection::Asc));
        filter
            .conditions()
            .scope("s.branch_id", &scope)
            .contains_any(&["s.first_name", "s.last_name"], params.name.as_deref())
            .eq_opt("s.is_active", params.is_active);
        Ok(fetch_page(&self.pool, &filter, page).await?)
    }

    pub async fn get(&self, principal: &Principal, student_id: i64, branch_id: Option<i64>) -> ServiceResult<Student> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        self.find(student_id, &scope).await
    }

    pub async fn create(&self, principal: &Principal, branch_id: Option<i64>, body: &Value) -> ServiceResult<Student> {
        let student = validate_new_student(body, today())?;
        let branch_id = resolve_write_scope(principal, student.branch_id, branch_id)?.require()?;
        references::ensure_branch(&self.pool, branch_id).await?;

        let profile = &student.profile;
        let student_id: i64 = sqlx::query_scalar(
            "INSERT INTO students (branch_id, first_name, last_name, dob, gender) \
             VALUES ($1, $2, $3, $4, $5) RETURNING student_id",
        )
        .bind(branch_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.dob)
        .bind(profile.gender.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created student {} in branch {}", student_id, branch_id);
        self.find(student_id, &BranchScope::Branch(branch_id)).await
    }

    /// Demographic update; deactivated students are left untouched
    pub async fn update(
        &self,
        principal: &Principal,
        student_id: i64,
        branch_id: Option<i64>,
        body: &Value,
    ) -> ServiceResult<Student> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let profile = validate_student_update(body, today())?;

        let result = sqlx::query(
            "UPDATE students SET first_name = $1, last_name = $2, dob = $3, gender = $4, updated_at = now() \
             WHERE student_id = $5 AND is_active AND ($6::BIGINT IS NULL OR branch_id = $6)",
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.dob)
        .bind(profile.gender.as_str())
        .bind(student_id)
        .bind(scope.branch_id())
        .execute(&self.pool)
        .await?;
        expect_affected(result.rows_affected(), "Student not found or inactive")?;

        tracing::info!("Updated student {} (scope {:?})", student_id, scope);
        self.find(student_id, &scope).await
    }

    /// Soft removal: the row and its history stay, the student drops out of enrollment checks
    pub async fn deactivate(&self, principal: &Principal, student_id: i64, branch_id: Option<i64>) -> ServiceResult<Student> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let result = sqlx::query(
            "UPDATE students SET is_active = FALSE, updated_at = now() \
             WHERE student_id = $1 AND is_active AND ($2::BIGINT IS NULL OR branch_id = $2)",
        )
        .bind(student_id)
        .bind(scope.branch_id())
        .execute(&self.pool)
        .await?;
        expect_affected(result.rows_affected(), "Student not found or already inactive")?;

        tracing::info!("Deactivated student {} (scope {:?})", student_id, scope);
        self.find(student_id, &scope).await
    }

    /// Hard delete; enrollments, payments and invoices go with it through ON DELETE CASCADE
    pub async fn purge(&self, principal: &Principal, student_id: i64, branch_id: Option<i64>) -> ServiceResult<()> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let result = sqlx::query("DELETE FROM students WHERE student_id = $1 AND ($2::BIGINT IS NULL OR branch_id = $2)")
            .bind(student_id)
            .bind(scope.branch_id())
            .execute(&self.pool)
            .await?;
        expect_affected(result.rows_affected(), "Student not found")?;

        tracing::info!("Deleted student {} (scope {:?})", student_id, scope);
        Ok(())
    }

    async fn find(&self, student_id: i64, scope: &BranchScope) -> ServiceResult<Student> {
        let mut filter = Filter::new(STUDENT_SELECT, STUDENT_FROM);
        filter.conditions().eq("s.student_id", student_id).scope("s.branch_id", scope);
        fetch_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| ServiceError::not_found("Student not found"))
    }
}
