use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use hrdesk_core::domain::health_check::{
    HealthCheck, HealthCheckId, HealthCheckInput, HealthCheckStatus,
};
use hrdesk_core::errors::{ApplicationError, DomainError};

use super::{ApiError, AppState, RequestContext};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub year: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBody {
    #[serde(default)]
    pub completed_date: Option<NaiveDate>,
}

/// Staff see every check; everyone else sees the checks booked under their email.
pub async fn list(
    State(state): State<AppState>,
    context: RequestContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<HealthCheck>>, ApiError> {
    let year = match query.year.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
            context.fail(DomainError::Validation(format!("year `{raw}` is not a number")))
        })?),
        None => None,
    };
    let status = match query.status.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(HealthCheckStatus::parse(raw).ok_or_else(|| {
            context.fail(DomainError::Validation(format!("unknown health check status `{raw}`")))
        })?),
        None => None,
    };

    let mut checks =
        state.health_checks.list(year, status).await.map_err(|error| context.fail(error))?;
    if !context.actor.role.sees_all_records() {
        checks.retain(|check| context.actor.is(&check.employee_email));
    }
    Ok(Json(checks))
}

pub async fn create(
    State(state): State<AppState>,
    context: RequestContext,
    Json(input): Json<HealthCheckInput>,
) -> Result<(StatusCode, Json<HealthCheck>), ApiError> {
    context.require_staff("schedule health checks")?;
    let check = HealthCheck::create(input, Utc::now()).map_err(|error| context.fail(error))?;
    state.health_checks.insert(&check).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "health_check.scheduled",
        correlation_id = %context.correlation_id,
        health_check_id = %check.id.0,
        scheduled_date = %check.scheduled_date,
        "health check scheduled"
    );
    Ok((StatusCode::CREATED, Json(check)))
}

pub async fn update(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(input): Json<HealthCheckInput>,
) -> Result<Json<HealthCheck>, ApiError> {
    context.require_staff("edit health checks")?;
    let mut check = load(&state, &context, &id).await?;
    check.apply(input, Utc::now()).map_err(|error| context.fail(error))?;
    state.health_checks.update(&check).await.map_err(|error| context.fail(error))?;
    Ok(Json(check))
}

pub async fn remove(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    context.require_staff("delete health checks")?;
    let deleted = state
        .health_checks
        .delete(&HealthCheckId(id.clone()))
        .await
        .map_err(|error| context.fail(error))?;
    if !deleted {
        return Err(context.fail(ApplicationError::not_found("health check", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Marks a check completed. The body is optional; the completion date defaults to today.
pub async fn complete(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<HealthCheck>, ApiError> {
    context.require_staff("complete health checks")?;
    let body: CompleteBody = if body.is_empty() {
        CompleteBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|error| {
            context.fail(DomainError::Validation(format!("invalid completion body: {error}")))
        })?
    };

    let mut check = load(&state, &context, &id).await?;
    let now = Utc::now();
    let completed_on = body.completed_date.unwrap_or_else(|| now.date_naive());
    if completed_on < check.scheduled_date {
        return Err(context.fail(DomainError::Validation(
            "completed date must not precede the scheduled date".to_string(),
        )));
    }
    check.complete(completed_on, now);
    state.health_checks.update(&check).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "health_check.completed",
        correlation_id = %context.correlation_id,
        health_check_id = %check.id.0,
        completed_date = %completed_on,
        "health check completed"
    );
    Ok(Json(check))
}

async fn load(state: &AppState, context: &RequestContext, id: &str) -> Result<HealthCheck, ApiError> {
    state
        .health_checks
        .find_by_id(&HealthCheckId(id.to_string()))
        .await
        .map_err(|error| context.fail(error))?
        .ok_or_else(|| context.fail(ApplicationError::not_found("health check", id)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::api::test_support::{app, call, HR, SATO, TANAKA};

    fn booking(name: &str, email: &str, date: &str) -> Value {
        json!({"employeeName": name, "employeeEmail": email, "scheduledDate": date})
    }

    async fn book(app: &axum::Router, body: Value) -> String {
        let (status, created) = call(app, "POST", "/api/v1/health-checks", HR, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        created["id"].as_str().expect("id").to_string()
    }

    #[tokio::test]
    async fn listing_sorts_newest_first_and_filters() {
        let app = app().await;
        book(&app, booking("Sato", SATO.0, "2026-05-10")).await;
        book(&app, booking("Tanaka", TANAKA.0, "2026-06-01")).await;
        book(&app, booking("Tanaka", TANAKA.0, "2025-06-03")).await;

        let (status, all) = call(&app, "GET", "/api/v1/health-checks?year=2026", HR, None).await;
        assert_eq!(status, StatusCode::OK);
        let dates: Vec<_> =
            all.as_array().expect("array").iter().map(|check| check["scheduledDate"].clone()).collect();
        assert_eq!(dates, vec![json!("2026-06-01"), json!("2026-05-10")]);

        let (_, own) = call(&app, "GET", "/api/v1/health-checks", TANAKA, None).await;
        assert_eq!(own.as_array().map(Vec::len), Some(2));

        let (_, scheduled) =
            call(&app, "GET", "/api/v1/health-checks?status=scheduled", HR, None).await;
        assert_eq!(scheduled.as_array().map(Vec::len), Some(3));

        let (status, _) = call(&app, "GET", "/api/v1/health-checks?status=done", HR, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn completing_sets_status_and_date() {
        let app = app().await;
        let id = book(&app, booking("Tanaka", TANAKA.0, "2026-06-01")).await;
        let uri = format!("/api/v1/health-checks/{id}/complete");

        let (status, _) = call(&app, "POST", &uri, TANAKA, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) =
            call(&app, "POST", &uri, HR, Some(json!({"completedDate": "2026-05-01"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, done) =
            call(&app, "POST", &uri, HR, Some(json!({"completedDate": "2026-06-02"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["status"], "completed");
        assert_eq!(done["completedDate"], "2026-06-02");
    }

    #[tokio::test]
    async fn staff_edit_and_delete_bookings() {
        let app = app().await;
        let id = book(&app, booking("Sato", SATO.0, "2026-05-10")).await;
        let uri = format!("/api/v1/health-checks/{id}");

        let mut recheck = booking("Sato", SATO.0, "2026-05-10");
        recheck["status"] = json!("recheck_required");
        recheck["notes"] = json!("Blood pressure");
        let (status, _) = call(&app, "PUT", &uri, SATO, Some(recheck.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, updated) = call(&app, "PUT", &uri, HR, Some(recheck)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "recheck_required");
        assert_eq!(updated["notes"], "Blood pressure");

        let (status, _) = call(&app, "DELETE", &uri, HR, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "POST", &format!("{uri}/complete"), HR, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
