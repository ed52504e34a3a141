use serde_json::Value;
use sqlx::PgPool;

use super::{expect_affected, references, ServiceError, ServiceResult};
use crate::auth::Principal;
use crate::database::models::course::{Course, COURSE_FROM, COURSE_SELECT};
use crate::database::query_builder::{fetch_optional, fetch_page};
use crate::filter::{Filter, FilterOrder, Page, PageOf};
use crate::policy::{resolve_branch_scope, resolve_write_scope, BranchScope};
use crate::validation::course::validate_course;

pub struct CourseService {
    pool: PgPool,
}

impl CourseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `name` matches a substring of the course name
    pub async fn list(
        &self,
        principal: &Principal,
        branch_id: Option<i64>,
        name: Option<&str>,
        page: &Page,
    ) -> ServiceResult<PageOf<Course>> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(COURSE_SELECT, COURSE_FROM).order(FilterOrder::asc("co.course_id"));
        filter
            .conditions()
            .scope("co.branch_id", &scope)
            .contains_any(&["co.course_name"], name);
        Ok(fetch_page(&self.pool, &filter, page).await?)
    }

    pub async fn get(&self, principal: &Principal, course_id: i64, branch_id: Option<i64>) -> ServiceResult<Course> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        self.find(course_id, &scope).await
    }

    pub async fn create(&self, principal: &Principal, branch_id: Option<i64>, body: &Value) -> ServiceResult<Course> {
        let fields = validate_course(body)?;
        let branch_id = resolve_write_scope(principal, fields.branch_id, branch_id)?.require()?;
        references::ensure_branch(&self.pool, branch_id).await?;

        let course_id: i64 = sqlx::query_scalar(
            "INSERT INTO courses (branch_id, course_name, price) VALUES ($1, $2, $3) RETURNING course_id",
        )
        .bind(branch_id)
        .bind(&fields.course_name)
        .bind(fields.price)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created course {} in branch {}", course_id, branch_id);
        self.find(course_id, &BranchScope::Branch(branch_id)).await
    }

    /// Same move rule as classes: a course that is still referenced keeps its branch
    pub async fn update(
        &self,
        principal: &Principal,
        course_id: i64,
        branch_id: Option<i64>,
        body: &Value,
    ) -> ServiceResult<Course> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let fields = validate_course(body)?;

        let mut tx = self.pool.begin().await?;
        let current: i64 = sqlx::query_scalar(
            "SELECT branch_id FROM courses WHERE course_id = $1 AND ($2::BIGINT IS NULL OR branch_id = $2) FOR UPDATE",
        )
        .bind(course_id)
        .bind(scope.branch_id())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Course not found"))?;

        let target = match fields.branch_id {
            Some(requested) if requested != current => {
                let target = resolve_branch_scope(principal, Some(requested))?.require()?;
                references::ensure_branch(&mut *tx, target).await?;
                if references::billing_references(&mut *tx, "course_id", course_id).await? {
                    return Err(ServiceError::Conflict(
                        "Cannot move this course to another branch while enrollments or payments reference it."
                            .to_string(),
                    ));
                }
                target
            }
            _ => current,
        };

        sqlx::query(
            "UPDATE courses SET course_name = $1, price = $2, branch_id = $3, updated_at = now() WHERE course_id = $4",
        )
        .bind(&fields.course_name)
        .bind(fields.price)
        .bind(target)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!("Updated course {} in branch {}", course_id, target);
        self.find(course_id, &BranchScope::Branch(target)).await
    }

    pub async fn delete(&self, principal: &Principal, course_id: i64, branch_id: Option<i64>) -> ServiceResult<()> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        self.find(course_id, &scope).await?;
        let in_use: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM enrollments WHERE course_id = $1)")
            .bind(course_id)
            .fetch_one(&self.pool)
            .await?;
        if in_use {
            return Err(ServiceError::Conflict(
                "Cannot delete this course because it is currently assigned to one or more students.".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM courses WHERE course_id = $1 AND ($2::BIGINT IS NULL OR branch_id = $2)")
            .bind(course_id)
            .bind(scope.branch_id())
            .execute(&self.pool)
            .await?;
        expect_affected(result.rows_affected(), "Course not found")?;

        tracing::info!("Deleted course {} (scope {:?})", course_id, scope);
        Ok(())
    }

    async fn find(&self, course_id: i64, scope: &BranchScope) -> ServiceResult<Course> {
        let mut filter = Filter::new(COURSE_SELECT, COURSE_FROM);
        filter.conditions().eq("co.course_id", course_id).scope("co.branch_id", scope);
        fetch_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| ServiceError::not_found("Course not found"))
    }
}
