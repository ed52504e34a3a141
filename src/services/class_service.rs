use serde_json::Value;
use sqlx::PgPool;

use super::{expect_affected, references, ServiceError, ServiceResult};
use crate::auth::Principal;
use crate::database::models::class::{Class, CLASS_FROM, CLASS_SELECT};
use crate::database::query_builder::{fetch_optional, fetch_page};
use crate::filter::{Filter, FilterOrder, Page, PageOf};
use crate::policy::{resolve_branch_scope, resolve_write_scope, BranchScope};
use crate::validation::class::validate_class;

#[derive(Debug, Clone, Default)]
pub struct ClassFilter {
    pub room_number: Option<String>,
    pub book: Option<String>,
}

pub struct ClassService {
    pool: PgPool,
}

impl ClassService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        branch_id: Option<i64>,
        params: &ClassFilter,
        page: &Page,
    ) -> ServiceResult<PageOf<Class>> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(CLASS_SELECT, CLASS_FROM).order(FilterOrder::asc("c.class_id"));
        filter
            .conditions()
            .scope("c.branch_id", &scope)
            .contains_any(&["c.room_number"], params.room_number.as_deref())
            .contains_any(&["c.book"], params.book.as_deref());
        Ok(fetch_page(&self.pool, &filter, page).await?)
    }

    pub async fn get(&self, principal: &Principal, class_id: i64, branch_id: Option<i64>) -> ServiceResult<Class> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        self.find(class_id, &scope).await
    }

    pub async fn create(&self, principal: &Principal, branch_id: Option<i64>, body: &Value) -> ServiceResult<Class> {
        let fields = validate_class(body)?;
        let branch_id = resolve_write_scope(principal, fields.branch_id, branch_id)?.require()?;
        references::ensure_branch(&self.pool, branch_id).await?;

        let class_id: i64 = sqlx::query_scalar(
            "INSERT INTO classes (branch_id, book, room_number, price) VALUES ($1, $2, $3, $4) RETURNING class_id",
        )
        .bind(branch_id)
        .bind(&fields.book)
        .bind(&fields.room_number)
        .bind(fields.price)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created class {} in branch {}", class_id, branch_id);
        self.find(class_id, &BranchScope::Branch(branch_id)).await
    }

    /// A `branch_id` in the body moves the class, subject to the same scope rule
    /// as create. A class that enrollments or payments still point at stays put.
    pub async fn update(
        &self,
        principal: &Principal,
        class_id: i64,
        branch_id: Option<i64>,
        body: &Value,
    ) -> ServiceResult<Class> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let fields = validate_class(body)?;

        let mut tx = self.pool.begin().await?;
        let current: i64 = sqlx::query_scalar(
            "SELECT branch_id FROM classes WHERE class_id = $1 AND ($2::BIGINT IS NULL OR branch_id = $2) FOR UPDATE",
        )
        .bind(class_id)
        .bind(scope.branch_id())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Class not found"))?;

        let target = match fields.branch_id {
            Some(requested) if requested != current => {
                let target = resolve_branch_scope(principal, Some(requested))?.require()?;
                references::ensure_branch(&mut *tx, target).await?;
                if references::billing_references(&mut *tx, "class_id", class_id).await? {
                    return Err(ServiceError::Conflict(
                        "Cannot move this class to another branch while enrollments or payments reference it."
                            .to_string(),
                    ));
                }
                target
            }
            _ => current,
        };

        sqlx::query(
            "UPDATE classes SET book = $1, room_number = $2, price = $3, branch_id = $4, updated_at = now() \
             WHERE class_id = $5",
        )
        .bind(&fields.book)
        .bind(&fields.room_number)
        .bind(fields.price)
        .bind(target)
        .bind(class_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        if target != current {
            tracing::info!("Moved class {} from branch {} to {}", class_id, current, target);
        }
        tracing::info!("Updated class {} in branch {}", class_id, target);
        self.find(class_id, &BranchScope::Branch(target)).await
    }

    /// Refused while any enrollment still points at the class
    pub async fn delete(&self, principal: &Principal, class_id: i64, branch_id: Option<i64>) -> ServiceResult<()> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        self.find(class_id, &scope).await?;
        let in_use: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM enrollments WHERE class_id = $1)")
            .bind(class_id)
            .fetch_one(&self.pool)
            .await?;
        if in_use {
            return Err(ServiceError::Conflict(
                "Cannot delete this class because it is currently assigned to one or more students.".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM classes WHERE class_id = $1 AND ($2::BIGINT IS NULL OR branch_id = $2)")
            .bind(class_id)
            .bind(scope.branch_id())
            .execute(&self.pool)
            .await?;
        expect_affected(result.rows_affected(), "Class not found")?;

        tracing::info!("Deleted class {} (scope {:?})", class_id, scope);
        Ok(())
    }

    async fn find(&self, class_id: i64, scope: &BranchScope) -> ServiceResult<Class> {
        let mut filter = Filter::new(CLASS_SELECT, CLASS_FROM);
        filter.conditions().eq("c.class_id", class_id).scope("c.branch_id", scope);
        fetch_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| ServiceError::not_found("Class not found"))
    }
}
