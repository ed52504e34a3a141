use rust_decimal::Decimal;
use serde_json::Value;

use super::{check_positive_price, Payload, ValidationResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFields {
    pub course_name: String,
    pub price: Decimal,
    pub branch_id: Option<i64>,
}

pub fn validate_course(body: &Value) -> ValidationResult<CourseFields> {
    let payload = Payload::new(body)?;
    payload.require(&["course_name", "price"])?;

    let course_name = payload.required_text("course_name")?;
    let price = payload.required_decimal("price")?;
    check_positive_price(price)?;
    let branch_id = payload.id("branch_id")?;

    Ok(CourseFields { course_name, price, branch_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn negative_price_is_rejected() {
        let err = validate_course(&json!({"course_name": "IELTS", "price": -10})).unwrap_err();
        assert_eq!(err.message, "Price must be greater than 0");
    }

    #[test]
    fn missing_name_is_reported_first() {
        let err = validate_course(&json!({"price": "abc"})).unwrap_err();
        assert_eq!(err.message, "Required field: course_name");
    }
}
