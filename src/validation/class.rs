use rust_decimal::Decimal;
use serde_json::Value;

use super::{check_positive_price, Payload, ValidationResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFields {
    pub book: String,
    pub room_number: Option<String>,
    pub price: Decimal,
    pub branch_id: Option<i64>,
}

pub fn validate_class(body: &Value) -> ValidationResult<ClassFields> {
    let payload = Payload::new(body)?;
    payload.require(&["book", "price"])?;

    let book = payload.required_text("book")?;
    let room_number = payload.text("room_number")?;
    let price = payload.required_decimal("price")?;
    check_positive_price(price)?;
    let branch_id = payload.id("branch_id")?;

    Ok(ClassFields { book, room_number, price, branch_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn price_must_be_positive() {
        let err = validate_class(&json!({"book": "Book 1", "price": 0})).unwrap_err();
        assert_eq!(err.message, "Price must be greater than 0");

        let class = validate_class(&json!({"book": "Book 1", "price": "45.50", "room_number": " 2B "})).unwrap();
        assert_eq!(class.price, Decimal::new(4550, 2));
        assert_eq!(class.room_number.as_deref(), Some("2B"));
        assert_eq!(class.branch_id, None);
    }
}
