//! Printable renderings of stored rows.

use std::fmt::Write;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::database::models::Invoice;

const RULE: &str = "----------------------------------------";

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Plain-text invoice document served by the download endpoint
pub fn render_invoice(invoice: &Invoice) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "INVOICE");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Invoice ID:      {}", invoice.invoice_id);
    let _ = writeln!(out, "Student:         {} {}", invoice.first_name, invoice.last_name);
    if let Some(course) = &invoice.course_name {
        let _ = writeln!(out, "Course:          {}", course);
    }
    let _ = writeln!(out, "Branch:          {}", invoice.branch_name);
    let _ = writeln!(out, "Payment period:  {}", invoice.payment_period_type);
    if let Some(description) = &invoice.description {
        let _ = writeln!(out, "Description:     {}", description);
    }
    let _ = writeln!(out, "Issue date:      {}", invoice.issue_date.format("%Y-%m-%d"));
    let _ = writeln!(out, "Due date:        {}", invoice.due_date.format("%Y-%m-%d"));
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Total amount:    {}", money(invoice.total_amount));
    let _ = writeln!(out, "Discount:        {}", money(invoice.discount_amount));
    let _ = writeln!(out, "Final amount:    {}", money(invoice.final_amount()));
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Status:          {}", invoice.status);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InvoiceStatus;
    use chrono::{NaiveDate, Utc};

    fn invoice() -> Invoice {
        Invoice {
            invoice_id: 12,
            student_id: 3,
            first_name: "Mina".to_string(),
            last_name: "Karimi".to_string(),
            payment_id: 40,
            payment_period_type: "Monthly".to_string(),
            description: None,
            course_id: Some(2),
            course_name: Some("English A1".to_string()),
            branch_id: 1,
            branch_name: "Downtown".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            total_amount: Decimal::new(15000, 2),
            discount_amount: Decimal::new(2550, 2),
            status: InvoiceStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn renders_amounts_with_two_decimals() {
        let text = render_invoice(&invoice());
        assert!(text.contains("Invoice ID:      12"));
        assert!(text.contains("Student:         Mina Karimi"));
        assert!(text.contains("Course:          English A1"));
        assert!(text.contains("Total amount:    150.00"));
        assert!(text.contains("Discount:        25.50"));
        assert!(text.contains("Final amount:    124.50"));
        assert!(text.contains("Status:          Pending"));
    }

    #[test]
    fn optional_lines_are_omitted() {
        let mut inv = invoice();
        inv.course_name = None;
        let text = render_invoice(&inv);
        assert!(!text.contains("Course:"));
        assert!(!text.contains("Description:"));

        inv.description = Some("March tuition".to_string());
        assert!(render_invoice(&inv).contains("Description:     March tuition"));
    }
}
