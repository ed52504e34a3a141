// app.rs - Application state and router assembly
//
// Public routes (`/`, `/health`, login) sit outside the authentication layer.
// Every other route goes through `require_auth` and then `authorize_route`,
// which consults the route table in `policy::routes`.

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::Database;
use crate::handlers::{protected, public};
use crate::middleware::{authorize_route, require_auth};
use crate::services::{
    AuthService, BranchService, ClassService, CourseService, DashboardService, EnrollmentService, InvoiceService,
    PaymentService, ReportService, StudentService, UserService,
};

/// Shared by every handler; cloning is cheap
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database, tokens: TokenService) -> Self {
        Self {
            db,
            tokens,
            config: Arc::new(config),
        }
    }

    pub fn pool(&self) -> PgPool {
        self.db.pool().clone()
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.tokens.clone())
    }

    pub fn branches(&self) -> BranchService {
        BranchService::new(self.pool())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.pool(), self.config.security.bcrypt_cost)
    }

    pub fn students(&self) -> StudentService {
        StudentService::new(self.pool())
    }

    pub fn classes(&self) -> ClassService {
        ClassService::new(self.pool())
    }

    pub fn courses(&self) -> CourseService {
        CourseService::new(self.pool())
    }

    pub fn enrollments(&self) -> EnrollmentService {
        EnrollmentService::new(self.pool())
    }

    pub fn payments(&self) -> PaymentService {
        PaymentService::new(self.pool())
    }

    pub fn invoices(&self) -> InvoiceService {
        InvoiceService::new(self.pool())
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.pool())
    }

    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.pool())
    }
}

pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .merge(auth_routes())
        .merge(branch_routes())
        .merge(user_routes())
        .merge(student_routes())
        .merge(class_routes())
        .merge(course_routes())
        .merge(enrollment_routes())
        .merge(payment_routes())
        .merge(invoice_routes())
        .merge(report_routes())
        // Layers run bottom-up: authenticate first, then check the route table
        .route_layer(from_fn(authorize_route))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/auth/login", post(public::auth::login))
        .merge(protected_routes)
        // Global middleware
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
}

fn branch_routes() -> Router<AppState> {
    use protected::branches;

    Router::new()
        .route("/api/branches", get(branches::list).post(branches::create))
        .route(
            "/api/branches/:id",
            get(branches::show).put(branches::update).delete(branches::delete),
        )
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", get(users::show).put(users::update).delete(users::delete))
        .route("/api/users/:id/change-password", put(users::change_password))
}

fn student_routes() -> Router<AppState> {
    use protected::students;

    Router::new()
        .route("/api/students", get(students::list).post(students::create))
        .route(
            "/api/students/:id",
            get(students::show).put(students::update).delete(students::purge),
        )
        .route("/api/students/:id/deactivate", put(students::deactivate))
}

fn class_routes() -> Router<AppState> {
    use protected::classes;

    Router::new()
        .route("/api/classes", get(classes::list).post(classes::create))
        .route(
            "/api/classes/:id",
            get(classes::show).put(classes::update).delete(classes::delete),
        )
}

fn course_routes() -> Router<AppState> {
    use protected::courses;

    Router::new()
        .route("/api/courses", get(courses::list).post(courses::create))
        .route(
            "/api/courses/:id",
            get(courses::show).put(courses::update).delete(courses::delete),
        )
}

fn enrollment_routes() -> Router<AppState> {
    use protected::enrollments;

    Router::new()
        .route("/api/enrollments", get(enrollments::list).post(enrollments::create))
        .route(
            "/api/enrollments/:id",
            get(enrollments::show).put(enrollments::update).delete(enrollments::delete),
        )
}

fn payment_routes() -> Router<AppState> {
    use protected::payments;

    Router::new()
        .route("/api/payments", get(payments::list).post(payments::create))
        .route(
            "/api/payments/:id",
            get(payments::show).put(payments::update).delete(payments::delete),
        )
}

fn invoice_routes() -> Router<AppState> {
    use protected::invoices;

    Router::new()
        .route("/api/invoices", get(invoices::list).post(invoices::create))
        .route(
            "/api/invoices/:id",
            get(invoices::show).put(invoices::update).delete(invoices::delete),
        )
        .route("/api/invoices/:id/download", get(invoices::download))
}

fn report_routes() -> Router<AppState> {
    use protected::{dashboard, reports};

    Router::new()
        .route("/api/reports/monthly-branch-payments", get(reports::monthly_branch))
        .route("/api/reports/monthly/branch", get(reports::monthly_branch))
        .route("/api/reports/monthly-student-payments", get(reports::monthly_student))
        .route("/api/dashboard", get(dashboard::summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::auth::Claims;
    use crate::policy::routes::ROUTE_TABLE;
    use crate::testing::{accountant, admin, test_state, MemoryStore};

    fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = app(test_state(MemoryStore::default()));
        let response = app.oneshot(request("GET", "/api/students", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"]["code"], 401);
        assert_eq!(body["message"], "Missing Authorization header");
    }

    #[tokio::test]
    async fn malformed_and_expired_tokens_are_rejected() {
        let state = test_state(MemoryStore::with(vec![admin(1)]));
        let expired = state
            .tokens
            .sign(&Claims {
                user_id: 1,
                username: "admin1".to_string(),
                role: crate::types::Role::Admin,
                branch_id: None,
                exp: Utc::now().timestamp() - 60,
                iat: Utc::now().timestamp() - 3600,
            })
            .unwrap();
        let app = app(state);

        let response = app.clone().oneshot(request("GET", "/api/auth/me", Some("garbage"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Malformed token");

        let response = app.oneshot(request("GET", "/api/auth/me", Some(&expired))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Token has expired");
    }

    #[tokio::test]
    async fn accountants_cannot_reach_admin_routes() {
        let caller = accountant(7, 2);
        let state = test_state(MemoryStore::with(vec![caller.clone()]));
        let token = state.tokens.issue(&caller).unwrap();
        let app = app(state);

        for (method, uri) in [
            ("POST", "/api/branches"),
            ("PUT", "/api/branches/2"),
            ("DELETE", "/api/users/3"),
            ("POST", "/api/auth/register"),
        ] {
            let response = app.clone().oneshot(request(method, uri, Some(&token))).await.unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} {}", method, uri);
            assert_eq!(body_json(response).await["message"], "Access denied: requires role Admin");
        }
    }

    #[tokio::test]
    async fn cross_branch_request_is_forbidden_before_touching_storage() {
        let caller = accountant(7, 2);
        let state = test_state(MemoryStore::with(vec![caller.clone()]));
        let token = state.tokens.issue(&caller).unwrap();
        let app = app(state);

        let response = app
            .oneshot(request("GET", "/api/students?branch_id=3", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await["message"],
            "Unauthorized: Accountants can only access their assigned branch"
        );
    }

    #[tokio::test]
    async fn me_returns_the_stored_identity() {
        let caller = accountant(7, 2);
        let store = MemoryStore::with(vec![caller.clone()]);
        let state = test_state(store.clone());
        let token = state.tokens.issue(&caller).unwrap();
        store.insert(accountant(7, 4));

        let response = app(state).oneshot(request("GET", "/api/auth/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["branch_id"], 4);
        assert_eq!(body["data"]["role"], "Accountant");
    }

    #[tokio::test]
    async fn malformed_path_ids_are_bad_requests() {
        let caller = admin(1);
        let state = test_state(MemoryStore::with(vec![caller.clone()]));
        let token = state.tokens.issue(&caller).unwrap();

        let response = app(state)
            .oneshot(request("GET", "/api/students/abc", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "id must be a positive integer in URL parameter");
    }

    #[tokio::test]
    async fn every_table_entry_is_routed() {
        let caller = admin(1);
        let state = test_state(MemoryStore::default());
        let token = state.tokens.issue(&caller).unwrap();
        let app = app(state);

        // Unknown subject: the route exists and reaches authentication rather than 404/405
        for rule in ROUTE_TABLE {
            let uri = rule.path.replace(":id", "1");
            let response = app.clone().oneshot(request(rule.method, &uri, Some(&token))).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", rule.method, rule.path);
        }
    }

    #[tokio::test]
    async fn health_reports_unavailable_database_with_200() {
        let response = app(test_state(MemoryStore::default()))
            .oneshot(request("GET", "/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["database"], "unavailable");
    }
}
