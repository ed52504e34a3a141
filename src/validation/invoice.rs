use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{check_date_order, Payload, ValidationError, ValidationResult};
use crate::types::InvoiceStatus;

const STATUS_MESSAGE: &str = r#"status must be "Pending", "Paid", or "Overdue""#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub student_id: i64,
    pub payment_id: i64,
    pub branch_id: Option<i64>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub status: InvoiceStatus,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoicePatch {
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
}

impl InvoicePatch {
    pub fn is_empty(&self) -> bool {
        *self == InvoicePatch::default()
    }
}

/// Amounts and dates an invoice ends up with after a create or a merged patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTerms {
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
}

impl InvoiceTerms {
    pub fn apply(self, patch: &InvoicePatch) -> Self {
        Self {
            issue_date: patch.issue_date.unwrap_or(self.issue_date),
            due_date: patch.due_date.unwrap_or(self.due_date),
            total_amount: patch.total_amount.unwrap_or(self.total_amount),
            discount_amount: patch.discount_amount.unwrap_or(self.discount_amount),
        }
    }

    pub fn check(&self) -> ValidationResult<()> {
        check_date_order(self.issue_date, self.due_date)?;
        check_net_amount(self.total_amount, self.discount_amount)
    }
}

impl NewInvoice {
    pub fn terms(&self) -> InvoiceTerms {
        InvoiceTerms {
            issue_date: self.issue_date,
            due_date: self.due_date,
            total_amount: self.total_amount,
            discount_amount: self.discount_amount,
        }
    }
}

pub fn validate_new_invoice(body: &Value) -> ValidationResult<NewInvoice> {
    let payload = Payload::new(body)?;
    payload.require(&["student_id", "payment_id", "issue_date", "due_date", "total_amount", "status"])?;

    let student_id = payload.required_id("student_id")?;
    let payment_id = payload.required_id("payment_id")?;
    let branch_id = payload.id("branch_id")?;

    let issue_date = payload.required_date("issue_date")?;
    let due_date = payload.required_date("due_date")?;
    check_date_order(issue_date, due_date)?;

    let total_amount = read_total(&payload)?
        .ok_or_else(|| ValidationError::field("total_amount", "total_amount must be a number greater than 0"))?;
    let discount_amount = read_discount(&payload)?.unwrap_or(Decimal::ZERO);
    let status = read_status(&payload)?.ok_or_else(|| ValidationError::field("status", STATUS_MESSAGE))?;

    let invoice = NewInvoice {
        student_id,
        payment_id,
        branch_id,
        issue_date,
        due_date,
        total_amount,
        discount_amount,
        status,
    };
    invoice.terms().check()?;
    Ok(invoice)
}

pub fn validate_invoice_patch(body: &Value) -> ValidationResult<InvoicePatch> {
    let payload = Payload::new(body)?;
    let patch = InvoicePatch {
        issue_date: payload.date("issue_date")?,
        due_date: payload.date("due_date")?,
        total_amount: read_total(&payload)?,
        discount_amount: read_discount(&payload)?,
        status: read_status(&payload)?,
    };
    if patch.is_empty() {
        return Err(ValidationError::new("No valid fields provided for update"));
    }
    Ok(patch)
}

pub fn check_net_amount(total: Decimal, discount: Decimal) -> ValidationResult<()> {
    if total - discount <= Decimal::ZERO {
        return Err(ValidationError::field(
            "discount_amount",
            "total_amount minus discount_amount must be greater than 0",
        ));
    }
    Ok(())
}

fn read_total(payload: &Payload<'_>) -> ValidationResult<Option<Decimal>> {
    let message = "total_amount must be a number greater than 0";
    match payload.decimal("total_amount") {
        Ok(Some(total)) if total > Decimal::ZERO => Ok(Some(total)),
        Ok(None) => Ok(None),
        _ => Err(ValidationError::field("total_amount", message)),
    }
}

fn read_discount(payload: &Payload<'_>) -> ValidationResult<Option<Decimal>> {
    let message = "discount_amount must be a non-negative number";
    match payload.decimal("discount_amount") {
        Ok(Some(discount)) if discount >= Decimal::ZERO => Ok(Some(discount)),
        Ok(None) => Ok(None),
        _ => Err(ValidationError::field("discount_amount", message)),
    }
}

fn read_status(payload: &Payload<'_>) -> ValidationResult<Option<InvoiceStatus>> {
    payload.choice("status", STATUS_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invoice(total: Value, discount: Value) -> Value {
        json!({
            "student_id": 1, "payment_id": 2, "branch_id": 3,
            "issue_date": "2024-01-01", "due_date": "2024-01-31",
            "total_amount": total, "discount_amount": discount, "status": "Pending"
        })
    }

    #[test]
    fn equal_total_and_discount_is_rejected() {
        let err = validate_new_invoice(&invoice(json!(100), json!(100))).unwrap_err();
        assert_eq!(err.message, "total_amount minus discount_amount must be greater than 0");
    }

    #[test]
    fn smallest_positive_net_is_accepted() {
        let parsed = validate_new_invoice(&invoice(json!(100), json!(99.99))).unwrap();
        assert_eq!(parsed.total_amount - parsed.discount_amount, Decimal::new(1, 2));
    }

    #[test]
    fn rules_fail_in_order() {
        let mut body = invoice(json!(0), json!(-1));
        body["issue_date"] = json!("2024/01/01");
        let err = validate_new_invoice(&body).unwrap_err();
        assert_eq!(err.message, "issue_date must be in YYYY-MM-DD format");

        body["issue_date"] = json!("2024-02-01");
        let err = validate_new_invoice(&body).unwrap_err();
        assert_eq!(err.message, "due_date must be after issue_date");

        body["issue_date"] = json!("2024-01-01");
        let err = validate_new_invoice(&body).unwrap_err();
        assert_eq!(err.message, "total_amount must be a number greater than 0");

        body["total_amount"] = json!(10);
        let err = validate_new_invoice(&body).unwrap_err();
        assert_eq!(err.message, "discount_amount must be a non-negative number");

        body["discount_amount"] = json!(0);
        body["status"] = json!("Void");
        let err = validate_new_invoice(&body).unwrap_err();
        assert_eq!(err.message, r#"status must be "Pending", "Paid", or "Overdue""#);
    }

    #[test]
    fn new_invoice_terms_carry_its_amounts() {
        let parsed = validate_new_invoice(&invoice(json!("80.50"), json!(0.5))).unwrap();
        let terms = parsed.terms();
        assert_eq!(terms.total_amount, Decimal::new(8050, 2));
        assert_eq!(terms.discount_amount, Decimal::new(5, 1));
        assert_eq!(terms.due_date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!(terms.check().is_ok());
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = validate_invoice_patch(&json!({"student_id": 4})).unwrap_err();
        assert_eq!(err.message, "No valid fields provided for update");
    }

    #[test]
    fn merged_terms_are_rechecked() {
        let stored = InvoiceTerms {
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            total_amount: Decimal::new(100, 0),
            discount_amount: Decimal::new(10, 0),
        };
        let patch = validate_invoice_patch(&json!({"discount_amount": 100})).unwrap();
        assert!(stored.apply(&patch).check().is_err());

        let patch = validate_invoice_patch(&json!({"status": "Paid", "total_amount": "150"})).unwrap();
        let merged = stored.apply(&patch);
        assert_eq!(merged.total_amount, Decimal::new(150, 0));
        assert!(merged.check().is_ok());
    }
}
