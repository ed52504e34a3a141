// handlers/protected/mod.rs - Handlers behind the bearer-token middleware
//
// Every route here is listed in `policy::routes::ROUTE_TABLE`; the role check
// has already passed by the time a handler runs. Branch scope is resolved by
// the services from the caller and the `branch_id` the request asks for.

pub mod auth;
pub mod branches;
pub mod classes;
pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod invoices;
pub mod payments;
pub mod reports;
pub mod students;
pub mod users;
