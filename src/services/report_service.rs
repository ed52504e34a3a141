use sqlx::PgPool;

use super::ServiceResult;
use crate::auth::Principal;
use crate::database::models::report::{BranchMonthlyTotal, StudentMonthlyTotal};
use crate::database::query_builder::fetch_all;
use crate::filter::{Filter, FilterOrder, SortDirection};
use crate::policy::resolve_branch_scope;
use crate::validation::report::DateRange;

const BRANCH_MONTHLY_SELECT: &str = "SELECT p.branch_id, b.branch_name, \
     to_char(date_trunc('month', p.issue_date), 'YYYY-MM') AS month, SUM(p.amount) AS total_amount";

const BRANCH_MONTHLY_FROM: &str = "FROM payments p JOIN branches b ON b.branch_id = p.branch_id";

const STUDENT_MONTHLY_SELECT: &str = "SELECT s.student_id, s.first_name, s.last_name, p.branch_id, b.branch_name, \
     to_char(date_trunc('month', p.payment_date), 'YYYY-MM') AS month, SUM(p.amount) AS total_amount";

const STUDENT_MONTHLY_FROM: &str = "FROM payments p \
     JOIN students s ON s.student_id = p.student_id \
     JOIN branches b ON b.branch_id = p.branch_id";

/// Monthly payment aggregates within the caller's branch scope
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Totals per branch and issue-date month; payments without an issue date are left out
    pub async fn monthly_branch_payments(
        &self,
        principal: &Principal,
        branch_id: Option<i64>,
        range: Option<DateRange>,
    ) -> ServiceResult<Vec<BranchMonthlyTotal>> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(BRANCH_MONTHLY_SELECT, BRANCH_MONTHLY_FROM)
            .group_by("p.branch_id, b.branch_name, month")
            .order(FilterOrder::desc("month").then("p.branch_id", SortDirection::Asc));
        let conditions = filter.conditions();
        conditions.condition("p.issue_date IS NOT NULL").scope("p.branch_id", &scope);
        if let Some(range) = range {
            conditions.between("p.issue_date", range.start, range.end);
        }
        Ok(fetch_all(&self.pool, &filter.to_sql()).await?)
    }

    /// Totals per student and payment-date month
    pub async fn monthly_student_payments(
        &self,
        principal: &Principal,
        branch_id: Option<i64>,
        range: Option<DateRange>,
    ) -> ServiceResult<Vec<StudentMonthlyTotal>> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(STUDENT_MONTHLY_SELECT, STUDENT_MONTHLY_FROM)
            .group_by("s.student_id, s.first_name, s.last_name, p.branch_id, b.branch_name, month")
            .order(FilterOrder::desc("month").then("s.student_id", SortDirection::Asc));
        let conditions = filter.conditions();
        conditions.scope("p.branch_id", &scope);
        if let Some(range) = range {
            conditions.between("p.payment_date", range.start, range.end);
        }
        Ok(fetch_all(&self.pool, &filter.to_sql()).await?)
    }
}
