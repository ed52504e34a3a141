use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{check_date_order, Payload, ValidationError, ValidationResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFields {
    pub student_id: i64,
    pub class_id: Option<i64>,
    pub course_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub original_amount: Decimal,
    pub discount_amount: Decimal,
    pub discount_percentage: Decimal,
    pub payment_period_type: String,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_date: NaiveDate,
    pub description: Option<String>,
    pub status: String,
}

impl PaymentFields {
    /// Net amount actually charged
    pub fn amount(&self) -> Decimal {
        self.original_amount - self.discount_amount
    }
}

pub fn validate_payment(body: &Value) -> ValidationResult<PaymentFields> {
    let payload = Payload::new(body)?;
    payload.require(&["student_id", "original_amount", "payment_period_type", "payment_date", "status"])?;

    let student_id = payload.required_id("student_id")?;
    let class_id = payload.id("class_id")?;
    let course_id = payload.id("course_id")?;
    let branch_id = payload.id("branch_id")?;

    let original_amount = payload.required_decimal("original_amount")?;
    if original_amount <= Decimal::ZERO {
        return Err(ValidationError::field("original_amount", "original_amount must be greater than 0"));
    }
    let discount_amount = payload.decimal("discount_amount")?.unwrap_or(Decimal::ZERO);
    if discount_amount < Decimal::ZERO {
        return Err(ValidationError::field("discount_amount", "discount_amount must be a non-negative number"));
    }
    let discount_percentage = payload.decimal("discount_percentage")?.unwrap_or(Decimal::ZERO);
    if discount_percentage < Decimal::ZERO || discount_percentage > Decimal::ONE_HUNDRED {
        return Err(ValidationError::field(
            "discount_percentage",
            "discount_percentage must be between 0 and 100",
        ));
    }

    let payment_period_type = payload.required_text("payment_period_type")?;
    let issue_date = payload.date("issue_date")?;
    let due_date = payload.date("due_date")?;
    if let (Some(issue), Some(due)) = (issue_date, due_date) {
        check_date_order(issue, due)?;
    }
    let payment_date = payload.required_date("payment_date")?;
    let description = payload.text("description")?;
    let status = payload.required_text("status")?;

    let fields = PaymentFields {
        student_id,
        class_id,
        course_id,
        branch_id,
        original_amount,
        discount_amount,
        discount_percentage,
        payment_period_type,
        issue_date,
        due_date,
        payment_date,
        description,
        status,
    };

    if fields.amount() <= Decimal::ZERO {
        return Err(ValidationError::field("discount_amount", "Final amount must be greater than 0"));
    }
    Ok(fields)
}
