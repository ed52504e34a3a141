use chrono::NaiveDate;
use serde_json::Value;

use super::{Payload, ValidationError, ValidationResult};
use crate::types::Gender;

/// Demographic fields shared by student create/update and enrollment writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentProfile {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub profile: StudentProfile,
    /// Optional for Accountants, whose branch is implied
    pub branch_id: Option<i64>,
}

const PROFILE_FIELDS: &[&str] = &["first_name", "last_name", "dob", "gender"];

pub fn validate_new_student(body: &Value, today: NaiveDate) -> ValidationResult<NewStudent> {
    let payload = Payload::new(body)?;
    read_new_student(&payload, today)
}

pub fn validate_student_update(body: &Value, today: NaiveDate) -> ValidationResult<StudentProfile> {
    let payload = Payload::new(body)?;
    payload.require(PROFILE_FIELDS)?;
    read_profile(&payload, today)
}

pub(crate) fn read_new_student(payload: &Payload<'_>, today: NaiveDate) -> ValidationResult<NewStudent> {
    payload.require(PROFILE_FIELDS)?;
    let profile = read_profile(payload, today)?;
    let branch_id = payload.id("branch_id")?;
    Ok(NewStudent { profile, branch_id })
}

pub(crate) fn read_profile(payload: &Payload<'_>, today: NaiveDate) -> ValidationResult<StudentProfile> {
    let first_name = payload.required_text("first_name")?;
    let last_name = payload.required_text("last_name")?;
    let gender = payload
        .choice::<Gender>("gender", "Invalid gender: must be Male or Female")?
        .ok_or_else(|| ValidationError::field("gender", "Invalid gender: must be Male or Female"))?;

    let dob = payload
        .date("dob")
        .ok()
        .flatten()
        .filter(|dob| *dob <= today)
        .ok_or_else(|| ValidationError::field("dob", "Invalid or future date of birth"))?;

    Ok(StudentProfile { first_name, last_name, dob, gender })
}
