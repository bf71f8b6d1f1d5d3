use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use hrdesk_db::{migrations, ping, DbPool};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: ProbeResult,
    pub database: ProbeResult,
    pub schema: ProbeResult,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let schema = if database.status == "ready" {
        schema_check(&state.db_pool).await
    } else {
        ProbeResult { status: "degraded", detail: "database unreachable".to_string() }
    };
    let ready = database.status == "ready" && schema.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: ProbeResult { status: "ready", detail: "hrdesk-server running".to_string() },
        database,
        schema,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> ProbeResult {
    match ping(pool).await {
        Ok(()) => ProbeResult { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            ProbeResult { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn schema_check(pool: &DbPool) -> ProbeResult {
    let expected = migrations::known_count();

    match migrations::applied_count(pool).await {
        Ok(applied) if applied >= expected => {
            ProbeResult { status: "ready", detail: format!("{applied} migrations applied") }
        }
        Ok(applied) => ProbeResult {
            status: "degraded",
            detail: format!("{applied} of {expected} migrations applied"),
        },
        Err(error) => {
            ProbeResult { status: "degraded", detail: format!("migration table unreadable: {error}") }
        }
    }
}
