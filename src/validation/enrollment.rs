use chrono::NaiveDate;
use serde_json::Value;

use super::student::{read_new_student, read_profile, NewStudent, StudentProfile};
use super::{Payload, ValidationResult};

/// Student plus the optional class/course it is enrolled into
#[derive(Debug, Clone)]
pub struct NewEnrollment {
    pub student: NewStudent,
    pub class_id: Option<i64>,
    pub course_id: Option<i64>,
    pub enrollment_date: Option<NaiveDate>,
}

impl NewEnrollment {
    pub fn enrolls(&self) -> bool {
        self.class_id.is_some() || self.course_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct EnrollmentUpdate {
    pub profile: StudentProfile,
    /// `None` keeps the current reference
    pub class_id: Option<i64>,
    pub course_id: Option<i64>,
}

pub fn validate_new_enrollment(body: &Value, today: NaiveDate) -> ValidationResult<NewEnrollment> {
    let payload = Payload::new(body)?;
    let student = read_new_student(&payload, today)?;
    Ok(NewEnrollment {
        student,
        class_id: payload.id("class_id")?,
        course_id: payload.id("course_id")?,
        enrollment_date: payload.date("enrollment_date")?,
    })
}

pub fn validate_enrollment_update(body: &Value, today: NaiveDate) -> ValidationResult<EnrollmentUpdate> {
    let payload = Payload::new(body)?;
    payload.require(&["first_name", "last_name", "dob", "gender"])?;
    let profile = read_profile(&payload, today)?;
    Ok(EnrollmentUpdate {
        profile,
        class_id: payload.id("class_id")?,
        course_id: payload.id("course_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn enrollment_target_is_optional() {
        let body = json!({"first_name": "A", "last_name": "B", "dob": "2012-01-01", "gender": "Male"});
        let enrollment = validate_new_enrollment(&body, today()).unwrap();
        assert!(!enrollment.enrolls());

        let body = json!({
            "first_name": "A", "last_name": "B", "dob": "2012-01-01", "gender": "Male",
            "class_id": 9, "enrollment_date": "2024-05-20"
        });
        let enrollment = validate_new_enrollment(&body, today()).unwrap();
        assert!(enrollment.enrolls());
        assert_eq!(enrollment.class_id, Some(9));
        assert_eq!(enrollment.enrollment_date, NaiveDate::from_ymd_opt(2024, 5, 20));
    }

    #[test]
    fn bad_class_id_is_rejected() {
        let body = json!({
            "first_name": "A", "last_name": "B", "dob": "2012-01-01", "gender": "Male", "class_id": "abc"
        });
        let err = validate_enrollment_update(&body, today()).unwrap_err();
        assert_eq!(err.message, "class_id must be a positive integer");
    }
}
