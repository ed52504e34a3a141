use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use super::payment::Payment;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BranchMonthlyTotal {
    pub branch_id: i64,
    pub branch_name: String,
    /// `YYYY-MM`
    pub month: String,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentMonthlyTotal {
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub branch_id: i64,
    pub branch_name: String,
    pub month: String,
    pub total_amount: Decimal,
}

pub type RecentPayment = Payment;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_students: i64,
    pub total_revenue: Decimal,
    pub active_classes: i64,
    pub recent_payments: Vec<RecentPayment>,
}
