use serde_json::Value;

use super::{Payload, ValidationError, ValidationResult};
use crate::types::Role;

#[derive(Debug, Clone)]
pub struct UserFields {
    pub username: String,
    /// Required on create; on update a present value replaces the hash
    pub password: Option<String>,
    pub role: Role,
    /// Always `None` for Admins
    pub branch_id: Option<i64>,
}

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_new_user(body: &Value) -> ValidationResult<UserFields> {
    let payload = Payload::new(body)?;
    payload.require(&["username", "password", "role"])?;
    let fields = read_user(&payload)?;
    if let Some(password) = &fields.password {
        check_password(password)?;
    }
    Ok(fields)
}

pub fn validate_user_update(body: &Value) -> ValidationResult<UserFields> {
    let payload = Payload::new(body)?;
    payload.require(&["username", "role"])?;
    let fields = read_user(&payload)?;
    if let Some(password) = &fields.password {
        check_password(password)?;
    }
    Ok(fields)
}

/// `{"newPassword": "..."}`
pub fn validate_password_change(body: &Value) -> ValidationResult<String> {
    let payload = Payload::new(body)?;
    let password = match payload.get("newPassword") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return Err(ValidationError::field("newPassword", "New password required")),
    };
    check_password(&password)?;
    Ok(password)
}

fn read_user(payload: &Payload<'_>) -> ValidationResult<UserFields> {
    let username = payload.required_text("username")?;
    // Passwords are taken verbatim, whitespace included
    let password = match payload.get("password") {
        None => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ValidationError::field("password", "password must be a string")),
    };
    let role: Role = payload
        .choice("role", "Invalid role: must be Admin or Accountant")?
        .ok_or_else(|| ValidationError::field("role", "Invalid role: must be Admin or Accountant"))?;

    let branch_id = match role {
        Role::Accountant => Some(
            payload
                .id("branch_id")?
                .ok_or_else(|| ValidationError::field("branch_id", "Branch ID required for Accountant"))?,
        ),
        Role::Admin => None,
    };

    Ok(UserFields { username, password, role, branch_id })
}

pub fn check_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::field(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accountant_needs_branch() {
        let err = validate_new_user(&json!({
            "username": "acct", "password": "secret1", "role": "Accountant"
        }))
        .unwrap_err();
        assert_eq!(err.message, "Branch ID required for Accountant");
    }

    #[test]
    fn admin_branch_is_dropped() {
        let fields = validate_new_user(&json!({
            "username": " root ", "password": "secret1", "role": "Admin", "branch_id": 4
        }))
        .unwrap();
        assert_eq!(fields.username, "root");
        assert_eq!(fields.role, Role::Admin);
        assert_eq!(fields.branch_id, None);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = validate_new_user(&json!({
            "username": "x", "password": "secret1", "role": "Teacher"
        }))
        .unwrap_err();
        assert_eq!(err.message, "Invalid role: must be Admin or Accountant");
    }

    #[test]
    fn update_allows_missing_password() {
        let fields = validate_user_update(&json!({
            "username": "acct", "role": "Accountant", "branch_id": "2"
        }))
        .unwrap();
        assert_eq!(fields.password, None);
        assert_eq!(fields.branch_id, Some(2));
    }

    #[test]
    fn password_change_requires_value() {
        let err = validate_password_change(&json!({})).unwrap_err();
        assert_eq!(err.message, "New password required");
        assert_eq!(validate_password_change(&json!({"newPassword": "hunter22"})).unwrap(), "hunter22");
    }
}
