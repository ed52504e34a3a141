use super::{Action, Resource};

/// One protected route and the capability it exercises
#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub method: &'static str,
    pub path: &'static str,
    pub resource: Resource,
    pub action: Action,
}

const fn rule(method: &'static str, path: &'static str, resource: Resource, action: Action) -> RouteRule {
    RouteRule { method, path, resource, action }
}

use Action::*;
use Resource::*;

/// Paths are the router's match patterns, not concrete URLs
pub static ROUTE_TABLE: &[RouteRule] = &[
    // Session
    rule("POST", "/api/auth/register", Session, Create),
    rule("POST", "/api/auth/logout", Session, Read),
    rule("GET", "/api/auth/me", Session, Read),
    // Branches
    rule("GET", "/api/branches", Branch, Read),
    rule("POST", "/api/branches", Branch, Create),
    rule("GET", "/api/branches/:id", Branch, Read),
    rule("PUT", "/api/branches/:id", Branch, Update),
    rule("DELETE", "/api/branches/:id", Branch, Delete),
    // Users
    rule("GET", "/api/users", User, Read),
    rule("POST", "/api/users", User, Create),
    rule("GET", "/api/users/:id", User, Read),
    rule("PUT", "/api/users/:id", User, Update),
    rule("DELETE", "/api/users/:id", User, Delete),
    rule("PUT", "/api/users/:id/change-password", User, Credentials),
    // Students
    rule("GET", "/api/students", Student, Read),
    rule("POST", "/api/students", Student, Create),
    rule("GET", "/api/students/:id", Student, Read),
    rule("PUT", "/api/students/:id", Student, Update),
    rule("PUT", "/api/students/:id/deactivate", Student, Update),
    rule("DELETE", "/api/students/:id", Student, Delete),
    // Classes
    rule("GET", "/api/classes", Class, Read),
    rule("POST", "/api/classes", Class, Create),
    rule("GET", "/api/classes/:id", Class, Read),
    rule("PUT", "/api/classes/:id", Class, Update),
    rule("DELETE", "/api/classes/:id", Class, Delete),
    // Courses
    rule("GET", "/api/courses", Course, Read),
    rule("POST", "/api/courses", Course, Create),
    rule("GET", "/api/courses/:id", Course, Read),
    rule("PUT", "/api/courses/:id", Course, Update),
    rule("DELETE", "/api/courses/:id", Course, Delete),
    // Enrollments
    rule("GET", "/api/enrollments", Enrollment, Read),
    rule("POST", "/api/enrollments", Enrollment, Create),
    rule("GET", "/api/enrollments/:id", Enrollment, Read),
    rule("PUT", "/api/enrollments/:id", Enrollment, Update),
    rule("DELETE", "/api/enrollments/:id", Enrollment, Delete),
    // Payments
    rule("GET", "/api/payments", Payment, Read),
    rule("POST", "/api/payments", Payment, Create),
    rule("GET", "/api/payments/:id", Payment, Read),
    rule("PUT", "/api/payments/:id", Payment, Update),
    rule("DELETE", "/api/payments/:id", Payment, Delete),
    // Invoices
    rule("GET", "/api/invoices", Invoice, Read),
    rule("POST", "/api/invoices", Invoice, Create),
    rule("GET", "/api/invoices/:id", Invoice, Read),
    rule("PUT", "/api/invoices/:id", Invoice, Update),
    rule("DELETE", "/api/invoices/:id", Invoice, Delete),
    rule("GET", "/api/invoices/:id/download", Invoice, Read),
    // Reports
    rule("GET", "/api/reports/monthly-branch-payments", Report, Read),
    rule("GET", "/api/reports/monthly/branch", Report, Read),
    rule("GET", "/api/reports/monthly-student-payments", Report, Read),
    rule("GET", "/api/dashboard", Dashboard, Read),
];

pub fn lookup(method: &str, path: &str) -> Option<&'static RouteRule> {
    ROUTE_TABLE
        .iter()
        .find(|rule| rule.path == path && rule.method.eq_ignore_ascii_case(method))
}
