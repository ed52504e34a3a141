use chrono::Datelike;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{today, ServiceResult};
use crate::auth::Principal;
use crate::database::models::payment::{PAYMENT_FROM, PAYMENT_SELECT};
use crate::database::models::report::DashboardSummary;
use crate::database::query_builder::{count, fetch_all};
use crate::filter::{Filter, FilterOrder, Page, SortDirection};
use crate::policy::resolve_branch_scope;

const RECENT_PAYMENTS: i64 = 5;

pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn summary(&self, principal: &Principal, branch_id: Option<i64>) -> ServiceResult<DashboardSummary> {
        let scope = resolve_branch_scope(principal, branch_id)?;

        let mut students = Filter::new("SELECT COUNT(*) AS count", "FROM students s");
        students.conditions().scope("s.branch_id", &scope);
        let total_students = count(&self.pool, &students.to_count_sql()).await?;

        let mut classes = Filter::new("SELECT COUNT(*) AS count", "FROM classes c");
        classes.conditions().scope("c.branch_id", &scope);
        let active_classes = count(&self.pool, &classes.to_count_sql()).await?;

        let today = today();
        let month_start = today.with_day(1).unwrap_or(today);
        let revenue: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM payments \
             WHERE payment_date >= $1 AND payment_date < ($1::DATE + INTERVAL '1 month') \
             AND ($2::BIGINT IS NULL OR branch_id = $2)",
        )
        .bind(month_start)
        .bind(scope.branch_id())
        .fetch_one(&self.pool)
        .await?;

        let mut recent = Filter::new(PAYMENT_SELECT, PAYMENT_FROM)
            .order(FilterOrder::desc("p.created_at").then("p.payment_id", SortDirection::Desc));
        recent.conditions().scope("p.branch_id", &scope);
        let page = Page { page: 1, limit: RECENT_PAYMENTS };
        let recent_payments = fetch_all(&self.pool, &recent.to_page_sql(&page)).await?;

        Ok(DashboardSummary {
            total_students,
            total_revenue: revenue.unwrap_or(Decimal::ZERO),
            active_classes,
            recent_payments,
        })
    }
}
