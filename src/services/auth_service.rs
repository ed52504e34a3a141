use serde::Serialize;
use serde_json::Value;

use super::{ServiceError, ServiceResult};
use crate::auth::password::verify_password;
use crate::auth::{Principal, TokenService};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Principal,
}

pub struct AuthService {
    tokens: TokenService,
}

impl AuthService {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    /// Username/password login
    pub async fn login(&self, body: &Value) -> ServiceResult<LoginResponse> {
        let username = body.get("username").and_then(Value::as_str).map(str::trim).unwrap_or("");
        let password = body.get("password").and_then(Value::as_str).unwrap_or("");
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::invalid("Username and password are required"));
        }

        let credential = match self.tokens.store().find_by_username(username).await? {
            Some(credential) => credential,
            None => {
                tracing::warn!("Login attempt for unknown user {}", username);
                return Err(ServiceError::Unauthorized("No user found with that username".to_string()));
            }
        };

        if !verify_password(password.to_string(), credential.password_hash.clone()).await? {
            tracing::warn!("Incorrect password for user {}", username);
            return Err(ServiceError::Unauthorized("Incorrect password".to_string()));
        }

        let user = credential.principal();
        let token = self.tokens.issue(&user)?;
        tracing::info!("User {} ({}) logged in", user.user_id, user.role);
        Ok(LoginResponse { token, user })
    }
}
