use serde_json::Value;
use sqlx::PgPool;

use super::{expect_affected, ServiceError, ServiceResult};
use crate::auth::Principal;
use crate::database::models::branch::{Branch, BRANCH_FROM, BRANCH_SELECT};
use crate::database::query_builder::{fetch_all, fetch_optional};
use crate::filter::{Filter, FilterOrder};
use crate::policy::{resolve_branch_scope, resolve_write_scope};
use crate::validation::branch::validate_branch;

pub struct BranchService {
    pool: PgPool,
}

impl BranchService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Admins see every branch unless they ask for one, Accountants only their own
    pub async fn list(&self, principal: &Principal, branch_id: Option<i64>) -> ServiceResult<Vec<Branch>> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(BRANCH_SELECT, BRANCH_FROM).order(FilterOrder::asc("branch_id"));
        filter.conditions().scope("branch_id", &scope);
        Ok(fetch_all(&self.pool, &filter.to_sql()).await?)
    }

    /// The path id is the requested scope; a `branch_id` query naming another branch is refused
    pub async fn get(&self, principal: &Principal, branch_id: i64, requested: Option<i64>) -> ServiceResult<Branch> {
        resolve_write_scope(principal, Some(branch_id), requested)?;
        self.find(branch_id).await
    }

    pub async fn create(&self, body: &Value) -> ServiceResult<Branch> {
        let fields = validate_branch(body)?;
        let branch_id: i64 = sqlx::query_scalar(
            "INSERT INTO branches (branch_name, phone, address) VALUES ($1, $2, $3) RETURNING branch_id",
        )
        .bind(&fields.branch_name)
        .bind(&fields.phone)
        .bind(&fields.address)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created branch {} ({})", branch_id, fields.branch_name);
        self.find(branch_id).await
    }

    pub async fn update(&self, principal: &Principal, branch_id: i64, body: &Value) -> ServiceResult<Branch> {
        resolve_branch_scope(principal, Some(branch_id))?;
        let fields = validate_branch(body)?;
        let result = sqlx::query(
            "UPDATE branches SET branch_name = $1, phone = $2, address = $3, updated_at = now() \
             WHERE branch_id = $4",
        )
        .bind(&fields.branch_name)
        .bind(&fields.phone)
        .bind(&fields.address)
        .bind(branch_id)
        .execute(&self.pool)
        .await?;
        expect_affected(result.rows_affected(), "Branch not found")?;

        tracing::info!("Updated branch {}", branch_id);
        self.find(branch_id).await
    }

    pub async fn delete(&self, principal: &Principal, branch_id: i64) -> ServiceResult<()> {
        resolve_branch_scope(principal, Some(branch_id))?;
        let result = sqlx::query("DELETE FROM branches WHERE branch_id = $1")
            .bind(branch_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::Conflict(_) => {
                    ServiceError::Conflict("Cannot delete this branch because other records still belong to it.".to_string())
                }
                other => other,
            })?;
        expect_affected(result.rows_affected(), "Branch not found")?;

        tracing::info!("Deleted branch {}", branch_id);
        Ok(())
    }

    async fn find(&self, branch_id: i64) -> ServiceResult<Branch> {
        let mut filter = Filter::new(BRANCH_SELECT, BRANCH_FROM);
        filter.conditions().eq("branch_id", branch_id);
        fetch_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| ServiceError::not_found("Branch not found"))
    }
}
