use axum::{extract::State, Json};
use chrono::{Datelike, Utc};
use serde::Serialize;

use hrdesk_core::domain::job::JobStatus;
use hrdesk_core::domain::meeting::day_range;
use hrdesk_core::domain::review::ReviewStatus;
use hrdesk_core::ringi::RequestScope;

use super::{ApiError, AppState, RequestContext};

/// Organisation-wide counters plus the caller's own approval queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub year: i32,
    pub employees: i64,
    pub pending_leave_requests: i64,
    pub pending_ringi: usize,
    pub pending_overtime_records: i64,
    pub scheduled_health_checks: usize,
    pub holidays_this_year: i64,
    pub active_jobs: i64,
    pub applications: i64,
    pub meetings_today: i64,
    pub awaiting_my_approval: usize,
}

pub async fn summary(
    State(state): State<AppState>,
    context: RequestContext,
) -> Result<Json<DashboardSummary>, ApiError> {
    let now = Utc::now();
    let year = now.year();
    let fail = |error| context.fail(error);

    let employees = state.employees.count().await.map_err(fail)?;
    let pending_leave_requests =
        state.leave.count_by_status(ReviewStatus::Pending).await.map_err(fail)?;
    let ringi = state.ringi.counts(&RequestScope::All).await.map_err(|error| context.fail(error))?;
    let pending_overtime_records =
        state.overtime.count_by_status(ReviewStatus::Pending).await.map_err(fail)?;
    let health_checks = state.health_checks.summary(None).await.map_err(fail)?;
    let holidays_this_year = state.holidays.count_for_year(year).await.map_err(fail)?;
    let active_jobs = state.jobs.count_by_status(JobStatus::Active).await.map_err(fail)?;
    let applications = state.applications.count().await.map_err(fail)?;
    let (today_start, today_end) = day_range(now.date_naive());
    let meetings_today =
        state.meetings.count_between(today_start, today_end).await.map_err(fail)?;
    let awaiting_my_approval = state
        .ringi
        .pending_for(&context.actor)
        .await
        .map_err(|error| context.fail(error))?
        .len();

    Ok(Json(DashboardSummary {
        year,
        employees,
        pending_leave_requests,
        pending_ringi: ringi.pending,
        pending_overtime_records,
        scheduled_health_checks: health_checks.scheduled,
        holidays_this_year,
        active_jobs,
        applications,
        meetings_today,
        awaiting_my_approval,
    }))
}
