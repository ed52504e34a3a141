use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::types::InvoiceStatus;
use crate::validation::invoice::InvoiceTerms;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Invoice {
    pub invoice_id: i64,
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub payment_id: i64,
    pub payment_period_type: String,
    pub description: Option<String>,
    pub course_id: Option<i64>,
    pub course_name: Option<String>,
    pub branch_id: i64,
    pub branch_name: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn final_amount(&self) -> Decimal {
        self.total_amount - self.discount_amount
    }

    pub fn terms(&self) -> InvoiceTerms {
        InvoiceTerms {
            issue_date: self.issue_date,
            due_date: self.due_date,
            total_amount: self.total_amount,
            discount_amount: self.discount_amount,
        }
    }
}

pub const INVOICE_SELECT: &str = "SELECT i.invoice_id, i.student_id, s.first_name, s.last_name, i.payment_id, \
     p.payment_period_type, p.description, p.course_id, co.course_name, i.branch_id, b.branch_name, \
     i.issue_date, i.due_date, i.total_amount, i.discount_amount, i.status, i.created_at, i.updated_at";

pub const INVOICE_FROM: &str = "FROM invoices i \
     JOIN students s ON s.student_id = i.student_id \
     JOIN payments p ON p.payment_id = i.payment_id \
     JOIN branches b ON b.branch_id = i.branch_id \
     LEFT JOIN courses co ON co.course_id = p.course_id";
