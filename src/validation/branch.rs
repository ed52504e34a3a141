use serde_json::Value;

use super::{Payload, ValidationError, ValidationResult};

/// Branch fields after trimming; blank phone/address are stored as NULL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchFields {
    pub branch_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub fn validate_branch(body: &Value) -> ValidationResult<BranchFields> {
    let payload = Payload::new(body)?;
    // Absent is reported differently from present-but-blank
    if payload.get("branch_name").is_none() {
        return Err(ValidationError::field("branch_name", "Required field: branch_name"));
    }
    Ok(BranchFields {
        branch_name: payload.required_text("branch_name")?,
        phone: payload.text("phone")?,
        address: payload.text("address")?,
    })
}
