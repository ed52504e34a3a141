use serde_json::Value;
use sqlx::PgPool;

use super::{expect_affected, references, ServiceError, ServiceResult};
use crate::auth::Principal;
use crate::database::models::payment::{Payment, PAYMENT_FROM, PAYMENT_SELECT};
use crate::database::query_builder::{fetch_optional, fetch_page};
use crate::filter::{Filter, FilterOrder, Page, PageOf, SortDirection};
use crate::policy::{resolve_branch_scope, resolve_write_scope, BranchScope};
use crate::validation::payment::{validate_payment, PaymentFields};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentSort {
    /// Newest payment date first
    #[default]
    Recent,
    /// Largest net amount first
    Amount,
}

impl PaymentSort {
    /// Anything other than `amount` falls back to recency
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("amount") => PaymentSort::Amount,
            _ => PaymentSort::Recent,
        }
    }

    fn order(self) -> FilterOrder {
        match self {
            PaymentSort::Amount => FilterOrder::desc("p.amount"),
            PaymentSort::Recent => FilterOrder::desc("p.payment_date"),
        }
        .then("p.payment_id", SortDirection::Desc)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub class_id: Option<i64>,
    pub course_id: Option<i64>,
    pub student_id: Option<i64>,
    pub student_name: Option<String>,
    pub sort: PaymentSort,
}

pub struct PaymentService {
    pool: PgPool,
}

impl PaymentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        branch_id: Option<i64>,
        params: &PaymentFilter,
        page: &Page,
    ) -> ServiceResult<PageOf<Payment>> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(PAYMENT_SELECT, PAYMENT_FROM).order(params.sort.order());
        filter
            .conditions()
            .scope("p.branch_id", &scope)
            .eq_opt("p.class_id", params.class_id)
            .eq_opt("p.course_id", params.course_id)
            .eq_opt("p.student_id", params.student_id)
            .contains_any(&["s.first_name", "s.last_name"], params.student_name.as_deref());
        Ok(fetch_page(&self.pool, &filter, page).await?)
    }

    pub async fn get(&self, principal: &Principal, payment_id: i64, branch_id: Option<i64>) -> ServiceResult<Payment> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        self.find(payment_id, &scope).await
    }

    pub async fn create(&self, principal: &Principal, branch_id: Option<i64>, body: &Value) -> ServiceResult<Payment> {
        let fields = validate_payment(body)?;
        let branch_id = resolve_write_scope(principal, fields.branch_id, branch_id)?.require()?;
        self.check_references(&fields, branch_id).await?;

        let payment_id: i64 = sqlx::query_scalar(
            "INSERT INTO payments (student_id, class_id, course_id, branch_id, original_amount, \
             discount_amount, discount_percentage, amount, payment_period_type, issue_date, due_date, \
             payment_date, description, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING payment_id",
        )
        .bind(fields.student_id)
        .bind(fields.class_id)
        .bind(fields.course_id)
        .bind(branch_id)
        .bind(fields.original_amount)
        .bind(fields.discount_amount)
        .bind(fields.discount_percentage)
        .bind(fields.amount())
        .bind(&fields.payment_period_type)
        .bind(fields.issue_date)
        .bind(fields.due_date)
        .bind(fields.payment_date)
        .bind(&fields.description)
        .bind(&fields.status)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "Created payment {} of {} for student {} in branch {}",
            payment_id,
            fields.amount(),
            fields.student_id,
            branch_id
        );
        self.find(payment_id, &BranchScope::Branch(branch_id)).await
    }

    /// Full replacement; the net amount is recomputed from the new figures
    pub async fn update(
        &self,
        principal: &Principal,
        payment_id: i64,
        branch_id: Option<i64>,
        body: &Value,
    ) -> ServiceResult<Payment> {
        let fields = validate_payment(body)?;
        let branch_id = resolve_write_scope(principal, fields.branch_id, branch_id)?.require()?;
        self.check_references(&fields, branch_id).await?;

        let result = sqlx::query(
            "UPDATE payments SET student_id = $1, class_id = $2, course_id = $3, original_amount = $4, \
             discount_amount = $5, discount_percentage = $6, amount = $7, payment_period_type = $8, \
             issue_date = $9, due_date = $10, payment_date = $11, description = $12, status = $13, \
             updated_at = now() \
             WHERE payment_id = $14 AND branch_id = $15",
        )
        .bind(fields.student_id)
        .bind(fields.class_id)
        .bind(fields.course_id)
        .bind(fields.original_amount)
        .bind(fields.discount_amount)
        .bind(fields.discount_percentage)
        .bind(fields.amount())
        .bind(&fields.payment_period_type)
        .bind(fields.issue_date)
        .bind(fields.due_date)
        .bind(fields.payment_date)
        .bind(&fields.description)
        .bind(&fields.status)
        .bind(payment_id)
        .bind(branch_id)
        .execute(&self.pool)
        .await?;
        expect_affected(result.rows_affected(), "Payment not found")?;

        tracing::info!("Updated payment {} in branch {}", payment_id, branch_id);
        self.find(payment_id, &BranchScope::Branch(branch_id)).await
    }

    /// Invoices raised against the payment are removed with it
    pub async fn delete(&self, principal: &Principal, payment_id: i64, branch_id: Option<i64>) -> ServiceResult<()> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let result = sqlx::query("DELETE FROM payments WHERE payment_id = $1 AND ($2::BIGINT IS NULL OR branch_id = $2)")
            .bind(payment_id)
            .bind(scope.branch_id())
            .execute(&self.pool)
            .await?;
        expect_affected(result.rows_affected(), "Payment not found")?;

        tracing::info!("Deleted payment {} (scope {:?})", payment_id, scope);
        Ok(())
    }

    async fn check_references(&self, fields: &PaymentFields, branch_id: i64) -> ServiceResult<()> {
        references::ensure_branch(&self.pool, branch_id).await?;
        references::ensure_student_in_branch(&self.pool, fields.student_id, branch_id).await?;
        if let Some(class_id) = fields.class_id {
            references::ensure_class_in_branch(&self.pool, class_id, branch_id).await?;
        }
        if let Some(course_id) = fields.course_id {
            references::course_in_branch(&self.pool, course_id, branch_id).await?;
        }
        Ok(())
    }

    async fn find(&self, payment_id: i64, scope: &BranchScope) -> ServiceResult<Payment> {
        let mut filter = Filter::new(PAYMENT_SELECT, PAYMENT_FROM);
        filter.conditions().eq("p.payment_id", payment_id).scope("p.branch_id", scope);
        fetch_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| ServiceError::not_found("Payment not found"))
    }
}
