mod common;

use anyhow::Result;
use common::{create_branch, unique, Api};
use reqwest::StatusCode;
use serde_json::{json, Value};

struct Ledger {
    branch: i64,
    course: i64,
    student: i64,
    payment: i64,
}

/// Branch with a 100.00 course, one enrolled student and a 90.00 payment issued in March 2024
async fn ledger(admin: &Api) -> Result<Ledger> {
    let branch = create_branch(admin).await?;
    let course = admin
        .create(
            "/api/courses",
            json!({ "course_name": unique("Algebra"), "price": 100, "branch_id": branch }),
            "course_id",
        )
        .await?;

    let (status, enrolled) = admin
        .post(
            "/api/enrollments",
            json!({
                "first_name": "Omar", "last_name": unique("Haddad"), "dob": "2011-09-02",
                "gender": "Male", "branch_id": branch, "course_id": course
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", enrolled);
    let student = enrolled["data"]["student"]["student_id"].as_i64().unwrap_or_default();

    let payment = admin
        .create(
            "/api/payments",
            json!({
                "student_id": student, "course_id": course, "branch_id": branch,
                "original_amount": 100, "discount_amount": 10,
                "payment_period_type": "Monthly", "issue_date": "2024-03-01", "due_date": "2024-03-15",
                "payment_date": "2024-03-05", "status": "Paid"
            }),
            "payment_id",
        )
        .await?;

    Ok(Ledger { branch, course, student, payment })
}

fn invoice_body(ledger: &Ledger, total: Value, discount: Value) -> Value {
    json!({
        "student_id": ledger.student, "payment_id": ledger.payment, "branch_id": ledger.branch,
        "issue_date": "2024-03-01", "due_date": "2024-03-31",
        "total_amount": total, "discount_amount": discount, "status": "Pending"
    })
}

#[tokio::test]
async fn payment_amount_is_net_of_discount() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let admin = Api::admin(server).await?;
    let ledger = ledger(&admin).await?;

    let (status, body) = admin.get(&format!("/api/payments/{}", ledger.payment)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"].as_f64(), Some(90.0));
    assert_eq!(body["data"]["course_id"], ledger.course);

    let (status, body) = admin
        .post(
            "/api/payments",
            json!({
                "student_id": ledger.student, "branch_id": ledger.branch,
                "original_amount": 50, "discount_amount": 50,
                "payment_period_type": "Monthly", "payment_date": "2024-03-05", "status": "Paid"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Final amount must be greater than 0");
    Ok(())
}

#[tokio::test]
async fn invoice_total_is_capped_by_course_price() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let admin = Api::admin(server).await?;
    let ledger = ledger(&admin).await?;

    let (status, body) = admin.post("/api/invoices", invoice_body(&ledger, json!(120), json!(0))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "total_amount cannot exceed course price");

    let (status, body) = admin.post("/api/invoices", invoice_body(&ledger, json!(100), json!(100))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "total_amount minus discount_amount must be greater than 0");

    let (status, body) = admin.post("/api/invoices", invoice_body(&ledger, json!(100), json!(10))).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "Pending");
    Ok(())
}

#[tokio::test]
async fn invoice_update_and_download() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let admin = Api::admin(server).await?;
    let ledger = ledger(&admin).await?;
    let invoice = admin
        .create("/api/invoices", invoice_body(&ledger, json!(100), json!(10)), "invoice_id")
        .await?;

    let (status, body) = admin
        .put(&format!("/api/invoices/{}", invoice), json!({ "due_date": "2024-02-01" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "due_date must be after issue_date");

    let (status, body) = admin.put(&format!("/api/invoices/{}", invoice), json!({ "status": "Paid" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Paid");

    let res = admin.raw_get(&format!("/api/invoices/{}/download", invoice)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let disposition = res
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(disposition, format!("attachment; filename=\"invoice_{}.txt\"", invoice));
    let text = res.text().await?;
    assert!(text.contains("Final amount:    90.00"), "{}", text);
    assert!(text.contains("Status:          Paid"));

    let (status, body) = admin.get(&format!("/api/invoices?branch_id={}&status=Paid", ledger.branch)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) = admin.get("/api/invoices?status=Late").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], r#"status must be "Pending", "Paid", or "Overdue""#);
    Ok(())
}

#[tokio::test]
async fn monthly_branch_report_groups_by_issue_month() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let admin = Api::admin(server).await?;
    let ledger = ledger(&admin).await?;

    let (status, body) = admin
        .get(&format!("/api/reports/monthly-branch-payments?branch_id={}", ledger.branch))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["month"], "2024-03");
    assert_eq!(rows[0]["total_amount"].as_f64(), Some(90.0));

    let (status, body) = admin
        .get(&format!(
            "/api/reports/monthly-branch-payments?branch_id={}&start_date=2024-04-01&end_date=2024-04-30",
            ledger.branch
        ))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["message"], "No payments found");

    let (status, _) = admin.get("/api/reports/monthly-branch-payments?start_date=2024-04-01").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn deleting_a_student_takes_its_billing_with_it() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let admin = Api::admin(server).await?;
    let ledger = ledger(&admin).await?;
    let invoice = admin
        .create("/api/invoices", invoice_body(&ledger, json!(100), json!(0)), "invoice_id")
        .await?;

    let (status, _) = admin.delete(&format!("/api/students/{}", ledger.student)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = admin.get(&format!("/api/payments/{}", ledger.payment)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = admin.get(&format!("/api/invoices/{}", invoice)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn amounts_beyond_the_money_column_are_rejected() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let admin = Api::admin(server).await?;
    let ledger = ledger(&admin).await?;

    let (status, body) = admin
        .post(
            "/api/courses",
            json!({ "course_name": unique("Astronomy"), "price": 1_000_000_000_000u64, "branch_id": ledger.branch }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "price must be at most 9999999999.99 with no more than 2 decimal places");

    let (status, body) = admin
        .post(
            "/api/payments",
            json!({
                "student_id": ledger.student, "branch_id": ledger.branch, "original_amount": "12.345",
                "payment_period_type": "Monthly", "payment_date": "2024-03-05", "status": "Paid"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "original_amount must be at most 9999999999.99 with no more than 2 decimal places"
    );

    let (status, _) = admin
        .post(
            "/api/courses",
            json!({ "course_name": unique("Astronomy"), "price": "9999999999.99", "branch_id": ledger.branch }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}
