use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgConnection, PgPool};

use super::{expect_affected, references, ServiceError, ServiceResult};
use crate::api::format::render_invoice;
use crate::auth::Principal;
use crate::database::models::invoice::{Invoice, INVOICE_FROM, INVOICE_SELECT};
use crate::database::query_builder::{fetch_optional, fetch_page};
use crate::filter::{Filter, FilterOrder, Page, PageOf, SortDirection};
use crate::policy::{resolve_branch_scope, resolve_write_scope, BranchScope};
use crate::types::InvoiceStatus;
use crate::validation::invoice::{validate_invoice_patch, validate_new_invoice};
use crate::validation::ValidationError;

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub student_id: Option<i64>,
}

/// A rendered invoice ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub filename: String,
    pub body: String,
}

pub struct InvoiceService {
    pool: PgPool,
}

impl InvoiceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        branch_id: Option<i64>,
        params: &InvoiceFilter,
        page: &Page,
    ) -> ServiceResult<PageOf<Invoice>> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let mut filter = Filter::new(INVOICE_SELECT, INVOICE_FROM)
            .order(FilterOrder::desc("i.issue_date").then("i.invoice_id", SortDirection::Desc));
        filter
            .conditions()
            .scope("i.branch_id", &scope)
            .eq_opt("i.status", params.status.map(|s| s.as_str()))
            .eq_opt("i.student_id", params.student_id);
        Ok(fetch_page(&self.pool, &filter, page).await?)
    }

    pub async fn get(&self, principal: &Principal, invoice_id: i64, branch_id: Option<i64>) -> ServiceResult<Invoice> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        self.find(invoice_id, &scope).await
    }

    /// Rules run in a fixed order and the first failure is reported:
    /// shape, scope, branch, student, payment, then the course rules when the
    /// payment is tied to a course.
    pub async fn create(&self, principal: &Principal, branch_id: Option<i64>, body: &Value) -> ServiceResult<Invoice> {
        let input = validate_new_invoice(body)?;
        let branch_id = resolve_write_scope(principal, input.branch_id, branch_id)?.require()?;

        let mut tx = self.pool.begin().await?;
        references::ensure_branch(&mut *tx, branch_id).await?;
        references::ensure_student_in_branch(&mut *tx, input.student_id, branch_id).await?;
        let course_id = references::payment_for_student(&mut *tx, input.payment_id, branch_id, input.student_id).await?;
        if let Some(course_id) = course_id {
            check_course_terms(&mut *tx, input.student_id, course_id, branch_id, input.total_amount).await?;
        }

        let invoice_id: i64 = sqlx::query_scalar(
            "INSERT INTO invoices (student_id, payment_id, branch_id, issue_date, due_date, total_amount, \
             discount_amount, status) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING invoice_id",
        )
        .bind(input.student_id)
        .bind(input.payment_id)
        .bind(branch_id)
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(input.total_amount)
        .bind(input.discount_amount)
        .bind(input.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            "Created invoice {} for payment {} in branch {}",
            invoice_id,
            input.payment_id,
            branch_id
        );
        self.find(invoice_id, &BranchScope::Branch(branch_id)).await
    }

    /// Merges the patch over the stored invoice and re-checks the merged terms
    pub async fn update(
        &self,
        principal: &Principal,
        invoice_id: i64,
        branch_id: Option<i64>,
        body: &Value,
    ) -> ServiceResult<Invoice> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let patch = validate_invoice_patch(body)?;

        let mut tx = self.pool.begin().await?;
        let current = find_in(&mut *tx, invoice_id, &scope).await?;
        let terms = current.terms().apply(&patch);
        terms.check()?;
        if let Some(course_id) = current.course_id {
            check_course_terms(&mut *tx, current.student_id, course_id, current.branch_id, terms.total_amount).await?;
        }

        let status = patch.status.unwrap_or(current.status);
        let result = sqlx::query(
            "UPDATE invoices SET issue_date = $1, due_date = $2, total_amount = $3, discount_amount = $4, \
             status = $5, updated_at = now() WHERE invoice_id = $6",
        )
        .bind(terms.issue_date)
        .bind(terms.due_date)
        .bind(terms.total_amount)
        .bind(terms.discount_amount)
        .bind(status.as_str())
        .bind(invoice_id)
        .execute(&mut *tx)
        .await?;
        expect_affected(result.rows_affected(), "Invoice not found or unauthorized for this branch")?;

        tx.commit().await?;
        tracing::info!("Updated invoice {} (scope {:?})", invoice_id, scope);
        self.find(invoice_id, &scope).await
    }

    pub async fn delete(&self, principal: &Principal, invoice_id: i64, branch_id: Option<i64>) -> ServiceResult<()> {
        let scope = resolve_branch_scope(principal, branch_id)?;
        let result = sqlx::query("DELETE FROM invoices WHERE invoice_id = $1 AND ($2::BIGINT IS NULL OR branch_id = $2)")
            .bind(invoice_id)
            .bind(scope.branch_id())
            .execute(&self.pool)
            .await?;
        expect_affected(result.rows_affected(), "Invoice not found or unauthorized for this branch")?;

        tracing::info!("Deleted invoice {} (scope {:?})", invoice_id, scope);
        Ok(())
    }

    pub async fn download(&self, principal: &Principal, invoice_id: i64, branch_id: Option<i64>) -> ServiceResult<InvoiceDocument> {
        let invoice = self.get(principal, invoice_id, branch_id).await?;
        Ok(InvoiceDocument {
            filename: format!("invoice_{}.txt", invoice.invoice_id),
            body: render_invoice(&invoice),
        })
    }

    async fn find(&self, invoice_id: i64, scope: &BranchScope) -> ServiceResult<Invoice> {
        let mut filter = Filter::new(INVOICE_SELECT, INVOICE_FROM);
        filter.conditions().eq("i.invoice_id", invoice_id).scope("i.branch_id", scope);
        fetch_optional(&self.pool, &filter.to_sql())
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice not found or unauthorized for this branch"))
    }
}

/// Course in branch, active enrollment, then the price ceiling
async fn check_course_terms(
    conn: &mut PgConnection,
    student_id: i64,
    course_id: i64,
    branch_id: i64,
    total_amount: Decimal,
) -> ServiceResult<()> {
    let price = references::course_in_branch(&mut *conn, course_id, branch_id).await?;
    references::ensure_active_enrollment(&mut *conn, student_id, course_id).await?;
    if total_amount > price {
        return Err(ValidationError::field("total_amount", "total_amount cannot exceed course price").into());
    }
    Ok(())
}

async fn find_in(conn: &mut PgConnection, invoice_id: i64, scope: &BranchScope) -> ServiceResult<Invoice> {
    let mut filter = Filter::new(INVOICE_SELECT, INVOICE_FROM);
    filter.conditions().eq("i.invoice_id", invoice_id).scope("i.branch_id", scope);
    fetch_optional(&mut *conn, &filter.to_sql())
        .await?
        .ok_or_else(|| ServiceError::not_found("Invoice not found or unauthorized for this branch"))
}
