use serde_json::Value;
use sqlx::PgPool;

use super::{expect_affected, references, ServiceError, ServiceResult};
use crate::auth::password::hash_password;
use crate::auth::Principal;
use crate::database::models::user::{User, USER_FROM, USER_SELECT};
use crate::database::query_builder::{fetch_all, fetch_optional};
use crate::filter::{Filter, FilterOrder};
use crate::policy::resolve_branch_scope;
use crate::types::Role;
use crate::validation::user::{validate_new_user, validate_password_change, validate_user_update, UserFields};

pub struct UserService {
    pool: PgPool,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(pool: PgPool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    pub async fn list(&self, principal: &Principal, branch_id: Option<i64>) -> ServiceResult<Vec<User>> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(USER_SELECT, USER_FROM).order(FilterOrder::asc("u.user_id"));
        filter.conditions().scope("u.branch_id", &scope);
        Ok(fetch_all(&self.pool, &filter.to_sql()).await?)
    }

    pub async fn get(&self, principal: &Principal, user_id: i64, branch_id: Option<i64>) -> ServiceResult<User> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(USER_SELECT, USER_FROM);
        filter.conditions().eq("u.user_id", user_id).scope("u.branch_id", &scope);
        fetch_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    pub async fn create(&self, body: &Value) -> ServiceResult<User> {
        let fields = validate_new_user(body)?;
        self.check_references(&fields, None).await?;

        let password = fields
            .password
            .clone()
            .ok_or_else(|| ServiceError::invalid("Required field: password"))?;
        let password_hash = hash_password(password, self.bcrypt_cost).await?;

        // The unique constraint is the real guard if two creates race past the check above
        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password_hash, role, branch_id) VALUES ($1, $2, $3, $4) \
             RETURNING user_id",
        )
        .bind(&fields.username)
        .bind(&password_hash)
        .bind(fields.role.as_str())
        .bind(fields.branch_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created {} user {} ({})", fields.role, user_id, fields.username);
        self.find(user_id).await
    }

    pub async fn update(&self, user_id: i64, body: &Value) -> ServiceResult<User> {
        let fields = validate_user_update(body)?;
        self.check_references(&fields, Some(user_id)).await?;

        let password_hash = match fields.password.clone() {
            Some(password) => Some(hash_password(password, self.bcrypt_cost).await?),
            None => None,
        };

        let result = sqlx::query(
            "UPDATE users SET username = $1, role = $2, branch_id = $3, \
             password_hash = COALESCE($4, password_hash), updated_at = now() \
             WHERE user_id = $5",
        )
        .bind(&fields.username)
        .bind(fields.role.as_str())
        .bind(fields.branch_id)
        .bind(password_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        expect_affected(result.rows_affected(), "User not found")?;

        tracing::info!("Updated user {}", user_id);
        self.find(user_id).await
    }

    pub async fn delete(&self, user_id: i64) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        expect_affected(result.rows_affected(), "User not found")?;

        tracing::info!("Deleted user {}", user_id);
        Ok(())
    }

    /// Admins may reset anyone; Accountants only themselves
    pub async fn change_password(&self, principal: &Principal, user_id: i64, body: &Value) -> ServiceResult<()> {
        if principal.role == Role::Accountant && principal.user_id != user_id {
            tracing::warn!("User {} attempted to change password of user {}", principal.user_id, user_id);
            return Err(ServiceError::Forbidden(
                "Unauthorized: You can only change your own password".to_string(),
            ));
        }
        let password = validate_password_change(body)?;
        let password_hash = hash_password(password, self.bcrypt_cost).await?;

        let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE user_id = $2")
            .bind(&password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        expect_affected(result.rows_affected(), "User not found")?;

        tracing::info!("Password changed for user {} by user {}", user_id, principal.user_id);
        Ok(())
    }

    async fn check_references(&self, fields: &UserFields, exclude: Option<i64>) -> ServiceResult<()> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND user_id <> COALESCE($2, 0))",
        )
        .bind(&fields.username)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        if taken {
            return Err(ServiceError::Conflict("Username already exists".to_string()));
        }

        if let Some(branch_id) = fields.branch_id {
            references::ensure_branch(&self.pool, branch_id).await?;
        }
        Ok(())
    }

    async fn find(&self, user_id: i64) -> ServiceResult<User> {
        let mut filter = Filter::new(USER_SELECT, USER_FROM);
        filter.conditions().eq("u.user_id", user_id);
        fetch_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }
}
