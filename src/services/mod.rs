//! Operations behind the HTTP handlers. Each service owns a clone of the pool,
//! resolves the caller's branch scope, runs the validators and executes the
//! reads or (transactional) writes.

pub mod auth_service;
pub mod branch_service;
pub mod class_service;
pub mod course_service;
pub mod dashboard_service;
pub mod enrollment_service;
pub mod invoice_service;
pub mod payment_service;
pub mod references;
pub mod report_service;
pub mod student_service;
pub mod user_service;

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::auth::AuthError;
use crate::database::manager::DatabaseError;
use crate::filter::FilterError;
use crate::policy::PolicyError;
use crate::validation::ValidationError;

pub use auth_service::AuthService;
pub use branch_service::BranchService;
pub use class_service::ClassService;
pub use course_service::CourseService;
pub use dashboard_service::DashboardService;
pub use enrollment_service::EnrollmentService;
pub use invoice_service::InvoiceService;
pub use payment_service::PaymentService;
pub use report_service::ReportService;
pub use student_service::StudentService;
pub use user_service::UserService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::Validation(ValidationError::new(message))
    }
}

/// SQLSTATE raised when a value overflows its NUMERIC column
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Storage constraint violations become client errors; everything else stays a storage failure
impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                let message = match db.constraint() {
                    Some("users_username_key") => "Username already exists",
                    _ => "Record already exists",
                };
                return ServiceError::Conflict(message.to_string());
            }
            if db.is_foreign_key_violation() {
                return ServiceError::Conflict("Record is still referenced by other records".to_string());
            }
            if db.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
                return ServiceError::invalid("Numeric value out of range");
            }
            if db.is_check_violation() {
                let constraint = db.constraint().unwrap_or("check").to_string();
                return ServiceError::invalid(format!("Constraint violated: {}", constraint));
            }
        }
        ServiceError::Database(DatabaseError::Sqlx(err))
    }
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Zero rows affected means the target was missing or outside the caller's scope
pub(crate) fn expect_affected(rows: u64, message: &str) -> ServiceResult<()> {
    if rows == 0 {
        return Err(ServiceError::not_found(message));
    }
    Ok(())
}
