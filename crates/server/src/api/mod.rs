//! JSON API under `/api/v1`. Every handler takes a [`RequestContext`] built from the
//! identity proxy headers.

pub mod applications;
pub mod dashboard;
pub mod employees;
pub mod error;
pub mod health_checks;
pub mod holidays;
pub mod identity;
pub mod jobs;
pub mod leave;
pub mod meetings;
pub mod overtime;
pub mod ringi;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use secrecy::SecretString;
use tower_http::trace::TraceLayer;

use hrdesk_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use hrdesk_core::domain::review::ReviewDecision;
use hrdesk_core::config::AppConfig;
use hrdesk_db::repositories::{
    ApplicationRepository, EmployeeRepository, HealthCheckRepository, HolidayRepository,
    JobRepository, LeaveRepository, MeetingRepository, OvertimeRepository,
    SqlApplicationRepository, SqlEmployeeRepository, SqlHealthCheckRepository,
    SqlHolidayRepository, SqlJobRepository, SqlLeaveRepository, SqlMeetingRepository,
    SqlOvertimeRepository, SqlRingiRepository,
};
use hrdesk_db::DbPool;

use crate::services::RingiService;

pub use error::ApiError;
pub use identity::RequestContext;

#[derive(Clone)]
pub struct AppState {
    pub ringi: RingiService,
    pub employees: Arc<dyn EmployeeRepository>,
    pub leave: Arc<dyn LeaveRepository>,
    pub overtime: Arc<dyn OvertimeRepository>,
    pub holidays: Arc<dyn HolidayRepository>,
    pub health_checks: Arc<dyn HealthCheckRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub meetings: Arc<dyn MeetingRepository>,
    pub audit: Arc<dyn AuditSink>,
    pub proxy_secret: Option<SecretString>,
    pub annual_leave_days: u32,
}

impl AppState {
    /// SQLite-backed state.
    pub fn from_pool(pool: DbPool, config: &AppConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            ringi: RingiService::new(Arc::new(SqlRingiRepository::new(pool.clone())), audit.clone()),
            employees: Arc::new(SqlEmployeeRepository::new(pool.clone())),
            leave: Arc::new(SqlLeaveRepository::new(pool.clone())),
            overtime: Arc::new(SqlOvertimeRepository::new(pool.clone())),
            holidays: Arc::new(SqlHolidayRepository::new(pool.clone())),
            health_checks: Arc::new(SqlHealthCheckRepository::new(pool.clone())),
            jobs: Arc::new(SqlJobRepository::new(pool.clone())),
            applications: Arc::new(SqlApplicationRepository::new(pool.clone())),
            meetings: Arc::new(SqlMeetingRepository::new(pool)),
            audit,
            proxy_secret: config.auth.proxy_secret.clone(),
            annual_leave_days: config.leave.annual_allowance_days,
        }
    }
}

/// Audits a leave or overtime review, whether it was applied or refused.
pub(crate) fn record_review<T>(
    state: &AppState,
    context: &RequestContext,
    category: AuditCategory,
    record_id: &str,
    decision: &ReviewDecision,
    result: &Result<T, ApiError>,
) {
    let audit = AuditContext::new(
        Some(record_id.to_string()),
        &context.correlation_id,
        &context.actor.email,
    );
    let verdict = match decision {
        ReviewDecision::Approve => "approve",
        ReviewDecision::Reject { .. } => "reject",
    };
    let event = match result {
        Ok(_) => AuditEvent::new(
            &audit,
            format!("{}.reviewed", category.as_str()),
            category,
            AuditOutcome::Success,
        ),
        Err(error) => AuditEvent::new(
            &audit,
            format!("{}.review_rejected", category.as_str()),
            category,
            AuditOutcome::Rejected,
        )
        .with_metadata("reason", error.0.message()),
    };
    state.audit.emit(
        event.with_metadata("decision", verdict).with_metadata("role", context.actor.role.as_str()),
    );
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/dashboard", get(dashboard::summary))
        .route("/api/v1/ringi", get(ringi::list).post(ringi::create))
        .route("/api/v1/ringi/pending", get(ringi::pending))
        .route("/api/v1/ringi/{id}", get(ringi::fetch))
        .route("/api/v1/ringi/{id}/decision", post(ringi::decide))
        .route("/api/v1/ringi/{id}/cancel", post(ringi::cancel))
        .route("/api/v1/employees", get(employees::list).post(employees::create))
        .route(
            "/api/v1/employees/{id}",
            get(employees::fetch).put(employees::update).delete(employees::remove),
        )
        .route("/api/v1/leave", get(leave::list).post(leave::create))
        .route("/api/v1/leave/balance", get(leave::balance))
        .route("/api/v1/leave/{id}/review", post(leave::review))
        .route("/api/v1/overtime", get(overtime::list).post(overtime::create))
        .route("/api/v1/overtime/stats", get(overtime::stats))
        .route("/api/v1/overtime/{id}", delete(overtime::remove))
        .route("/api/v1/overtime/{id}/review", post(overtime::review))
        .route("/api/v1/holidays", get(holidays::calendar).post(holidays::create))
        .route("/api/v1/holidays/{id}", put(holidays::update).delete(holidays::remove))
        .route("/api/v1/health-checks", get(health_checks::list).post(health_checks::create))
        .route(
            "/api/v1/health-checks/{id}",
            put(health_checks::update).delete(health_checks::remove),
        )
        .route("/api/v1/health-checks/{id}/complete", post(health_checks::complete))
        .route("/api/v1/jobs", get(jobs::list).post(jobs::create))
        .route("/api/v1/jobs/{id}", get(jobs::fetch).put(jobs::update).delete(jobs::remove))
        .route(
            "/api/v1/jobs/{id}/applications",
            get(applications::list_for_job).post(applications::submit),
        )
        .route("/api/v1/applications", get(applications::list))
        .route("/api/v1/applications/{id}/status", post(applications::change_status))
        .route("/api/v1/meetings", get(meetings::list).post(meetings::create))
        .route(
            "/api/v1/meetings/{id}",
            get(meetings::fetch).put(meetings::update).delete(meetings::remove),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use hrdesk_core::audit::InMemoryAuditSink;
    use hrdesk_core::config::AppConfig;
    use hrdesk_db::{connect_with_settings, migrations};

    use super::identity::{USER_EMAIL_HEADER, USER_NAME_HEADER, USER_ROLE_HEADER};
    use super::{router, AppState};

    pub async fn state() -> AppState {
        state_with_audit(InMemoryAuditSink::default()).await
    }

    pub async fn state_with_audit(audit: InMemoryAuditSink) -> AppState {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        AppState::from_pool(pool, &AppConfig::default(), Arc::new(audit))
    }

    pub async fn app() -> Router {
        router(state().await)
    }

    /// Identity as `(email, name, role)`.
    pub type Who<'a> = (&'a str, &'a str, &'a str);

    pub async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        who: Who<'_>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (email, name, role) = who;
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_EMAIL_HEADER, email)
            .header(USER_NAME_HEADER, name)
            .header(USER_ROLE_HEADER, role);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    pub const ADMIN: Who<'static> = ("admin@example.co.jp", "Admin", "admin");
    pub const HR: Who<'static> = ("jinji@example.co.jp", "Jinji", "hr");
    pub const TANAKA: Who<'static> = ("tanaka@example.co.jp", "Tanaka", "employee");
    pub const SATO: Who<'static> = ("sato@example.co.jp", "Sato", "employee");
    pub const APPLICANT: Who<'static> = ("mori@example.com", "Mori Ken", "applicant");
}
