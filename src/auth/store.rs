use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::Principal;
use crate::database::manager::DatabaseError;
use crate::types::Role;

/// A user row including the password hash; never serialized
#[derive(Debug, Clone, FromRow)]
pub struct Credential {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub branch_id: Option<i64>,
}

impl Credential {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.user_id,
            username: self.username.clone(),
            role: self.role,
            branch_id: self.branch_id,
        }
    }
}

/// Lookup seam used by login and by token verification
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<Principal>, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, DatabaseError>;
}

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<Principal>, DatabaseError> {
        let credential = sqlx::query_as::<_, Credential>(
            "SELECT user_id, username, password_hash, role, branch_id FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential.map(|c| c.principal()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, DatabaseError> {
        let credential = sqlx::query_as::<_, Credential>(
            "SELECT user_id, username, password_hash, role, branch_id FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }
}
