use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use hrdesk_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome};
use hrdesk_core::domain::application::{
    ApplicationId, JobApplication, NewApplication, StatusChange,
};
use hrdesk_core::domain::job::JobId;
use hrdesk_core::errors::ApplicationError;
use hrdesk_core::ringi::RequestScope;

use super::{jobs, ApiError, AppState, RequestContext};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub job_id: Option<String>,
}

/// Applies to a posting. Non-staff callers always apply under their own email.
pub async fn submit(
    State(state): State<AppState>,
    context: RequestContext,
    Path(job_id): Path<String>,
    Json(mut input): Json<NewApplication>,
) -> Result<(StatusCode, Json<JobApplication>), ApiError> {
    let job = jobs::load(&state, &context, &job_id).await?;
    if !context.actor.role.sees_all_records() {
        if !input.applicant_email.trim().is_empty() && !context.actor.is(&input.applicant_email) {
            return Err(context.forbid("apply on behalf of someone else"));
        }
        input.applicant_email = context.actor.email.clone();
    }

    let application =
        JobApplication::submit(&job, input, Utc::now()).map_err(|error| context.fail(error))?;
    state.applications.insert(&application).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "application.submitted",
        correlation_id = %context.correlation_id,
        application_id = %application.id.0,
        job_id = %job.id.0,
        "application submitted"
    );
    Ok((StatusCode::CREATED, Json(application)))
}

/// Staff see every application, optionally for one job; applicants see their own.
pub async fn list(
    State(state): State<AppState>,
    context: RequestContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<JobApplication>>, ApiError> {
    let job_id = query
        .job_id
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(JobId);
    let applications = state
        .applications
        .list(&RequestScope::for_actor(&context.actor), job_id.as_ref())
        .await
        .map_err(|error| context.fail(error))?;
    Ok(Json(applications))
}

pub async fn list_for_job(
    State(state): State<AppState>,
    context: RequestContext,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<JobApplication>>, ApiError> {
    context.require_staff("review applications")?;
    let job = jobs::load(&state, &context, &job_id).await?;
    let applications = state
        .applications
        .list(&RequestScope::All, Some(&job.id))
        .await
        .map_err(|error| context.fail(error))?;
    Ok(Json(applications))
}

pub async fn change_status(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<JobApplication>, ApiError> {
    context.require_staff("review applications")?;
    let mut application = state
        .applications
        .find_by_id(&ApplicationId(id.clone()))
        .await
        .map_err(|error| context.fail(error))?
        .ok_or_else(|| context.fail(ApplicationError::not_found("application", id.clone())))?;

    let previous = application.status;
    if !application.change_status(change, Utc::now()) {
        return Err(context.fail(ApplicationError::Conflict(format!(
            "application `{id}` is already {}",
            previous.as_str()
        ))));
    }
    state.applications.save_status(&application).await.map_err(|error| context.fail(error))?;

    let audit = AuditContext::new(Some(id), &context.correlation_id, &context.actor.email);
    state.audit.emit(
        AuditEvent::new(
            &audit,
            "application.status_changed",
            AuditCategory::Recruiting,
            AuditOutcome::Success,
        )
        .with_metadata("from", previous.as_str())
        .with_metadata("to", application.status.as_str()),
    );
    info!(
        event_name = "application.status_changed",
        correlation_id = %context.correlation_id,
        application_id = %application.id.0,
        status = application.status.as_str(),
        "application status changed"
    );
    Ok(Json(application))
}
