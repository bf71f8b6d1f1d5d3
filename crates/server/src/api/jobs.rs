use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use hrdesk_core::domain::job::{JobId, JobPosting, JobPostingInput, JobStatus};
use hrdesk_core::errors::{ApplicationError, DomainError};

use super::{ApiError, AppState, RequestContext};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// Staff may filter by any status; everyone else only sees active postings.
pub async fn list(
    State(state): State<AppState>,
    context: RequestContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<JobPosting>>, ApiError> {
    let requested = match query.status.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(JobStatus::parse(raw).ok_or_else(|| {
            context.fail(DomainError::Validation(format!("unknown job status `{raw}`")))
        })?),
        None => None,
    };
    let status =
        if context.actor.role.sees_all_records() { requested } else { Some(JobStatus::Active) };

    let jobs = state.jobs.list(status).await.map_err(|error| context.fail(error))?;
    Ok(Json(jobs))
}

pub async fn fetch(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<JobPosting>, ApiError> {
    let job = load(&state, &context, &id).await?;
    if !job.is_open() && !context.actor.role.sees_all_records() {
        return Err(context.fail(ApplicationError::not_found("job", id)));
    }
    Ok(Json(job))
}

pub async fn create(
    State(state): State<AppState>,
    context: RequestContext,
    Json(input): Json<JobPostingInput>,
) -> Result<(StatusCode, Json<JobPosting>), ApiError> {
    context.require_staff("post jobs")?;
    let job = JobPosting::create(input, &context.actor.email, Utc::now())
        .map_err(|error| context.fail(error))?;
    state.jobs.insert(&job).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "job.posted",
        correlation_id = %context.correlation_id,
        job_id = %job.id.0,
        department = %job.department,
        "job posted"
    );
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn update(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(input): Json<JobPostingInput>,
) -> Result<Json<JobPosting>, ApiError> {
    context.require_staff("edit jobs")?;
    let mut job = load(&state, &context, &id).await?;
    job.apply(input, Utc::now()).map_err(|error| context.fail(error))?;
    state.jobs.update(&job).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "job.updated",
        correlation_id = %context.correlation_id,
        job_id = %job.id.0,
        status = job.status.as_str(),
        "job updated"
    );
    Ok(Json(job))
}

pub async fn remove(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    context.require_staff("delete jobs")?;
    let deleted =
        state.jobs.delete(&JobId(id.clone())).await.map_err(|error| context.fail(error))?;
    if !deleted {
        return Err(context.fail(ApplicationError::not_found("job", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn load(
    state: &AppState,
    context: &RequestContext,
    id: &str,
) -> Result<JobPosting, ApiError> {
    state
        .jobs
        .find_by_id(&JobId(id.to_string()))
        .await
        .map_err(|error| context.fail(error))?
        .ok_or_else(|| context.fail(ApplicationError::not_found("job", id)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::api::test_support::{app, call, APPLICANT, HR, TANAKA};

    fn posting(title: &str) -> Value {
        json!({
            "title": title,
            "department": "開発部",
            "location": "東京",
            "employmentType": "contract",
            "salary": "4800000",
            "description": "Internal tools"
        })
    }

    async fn post(app: &axum::Router, body: Value) -> String {
        let (status, created) = call(app, "POST", "/api/v1/jobs", HR, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        created["id"].as_str().expect("id").to_string()
    }

    #[tokio::test]
    async fn staff_post_and_everyone_reads_active_jobs() {
        let app = app().await;
        let (status, _) = call(&app, "POST", "/api/v1/jobs", TANAKA, Some(posting("QA"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let id = post(&app, posting("QA")).await;
        let (status, job) = call(&app, "GET", &format!("/api/v1/jobs/{id}"), APPLICANT, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(job["employmentType"], "contract");
        assert_eq!(job["status"], "active");
        assert_eq!(job["postedBy"], HR.0);

        let (_, listed) = call(&app, "GET", "/api/v1/jobs", APPLICANT, None).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn missing_required_fields_are_bad_requests() {
        let app = app().await;
        let mut body = posting("QA");
        body["description"] = json!("  ");
        let (status, error) = call(&app, "POST", "/api/v1/jobs", HR, Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["error"]["message"].as_str().unwrap_or_default().contains("description"));
    }

    #[tokio::test]
    async fn closed_jobs_are_hidden_from_non_staff() {
        let app = app().await;
        let id = post(&app, posting("Closed role")).await;
        post(&app, posting("Open role")).await;

        let mut closed = posting("Closed role");
        closed["status"] = json!("closed");
        let uri = format!("/api/v1/jobs/{id}");
        let (status, _) = call(&app, "PUT", &uri, HR, Some(closed)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, "GET", &uri, TANAKA, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, visible) = call(&app, "GET", "/api/v1/jobs?status=closed", TANAKA, None).await;
        assert_eq!(visible.as_array().map(Vec::len), Some(1));
        assert_eq!(visible[0]["title"], "Open role");

        let (_, closed) = call(&app, "GET", "/api/v1/jobs?status=closed", HR, None).await;
        assert_eq!(closed.as_array().map(Vec::len), Some(1));
        let (_, all) = call(&app, "GET", "/api/v1/jobs", HR, None).await;
        assert_eq!(all.as_array().map(Vec::len), Some(2));

        let (status, _) = call(&app, "GET", "/api/v1/jobs?status=paused", HR, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_is_staff_only_and_reports_missing() {
        let app = app().await;
        let id = post(&app, posting("QA")).await;
        let uri = format!("/api/v1/jobs/{id}");

        let (status, _) = call(&app, "DELETE", &uri, TANAKA, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, "DELETE", &uri, HR, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "DELETE", &uri, HR, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
