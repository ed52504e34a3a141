//! Identity: signed session tokens, password hashing and the credential store
//! tokens are re-checked against.

pub mod password;
pub mod store;
pub mod token;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::types::Role;

pub use store::{CredentialStore, PgCredentialStore};
pub use token::TokenService;

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub branch_id: Option<i64>,
    pub exp: i64,
    pub iat: i64,
}

/// The caller as currently recorded in the credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub branch_id: Option<i64>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Malformed token")]
    Malformed,

    #[error("User no longer exists")]
    UnknownSubject,

    #[error("Token generation failed: {0}")]
    Signing(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}
