//! Row types returned by the services. Joined display columns (branch and
//! student names) are read alongside the owning row.

pub mod branch;
pub mod class;
pub mod course;
pub mod enrollment;
pub mod invoice;
pub mod payment;
pub mod report;
pub mod student;
pub mod user;

pub use branch::Branch;
pub use class::Class;
pub use course::Course;
pub use enrollment::Enrollment;
pub use invoice::Invoice;
pub use payment::Payment;
pub use report::{BranchMonthlyTotal, DashboardSummary, RecentPayment, StudentMonthlyTotal};
pub use student::Student;
pub use user::User;
