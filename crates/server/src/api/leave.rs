use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use hrdesk_core::audit::AuditCategory;
use hrdesk_core::domain::leave::{LeaveBalance, LeaveRequest, LeaveRequestId, NewLeaveRequest};
use hrdesk_core::domain::review::ReviewDecision;
use hrdesk_core::errors::ApplicationError;
use hrdesk_core::ringi::RequestScope;

use super::{record_review, ApiError, AppState, RequestContext};

/// Staff see every request, everyone else only their own.
pub async fn list(
    State(state): State<AppState>,
    context: RequestContext,
) -> Result<Json<Vec<LeaveRequest>>, ApiError> {
    let requests = state
        .leave
        .list(&RequestScope::for_actor(&context.actor))
        .await
        .map_err(|error| context.fail(error))?;
    Ok(Json(requests))
}

pub async fn create(
    State(state): State<AppState>,
    context: RequestContext,
    Json(input): Json<NewLeaveRequest>,
) -> Result<(StatusCode, Json<LeaveRequest>), ApiError> {
    let request =
        LeaveRequest::submit(input, &context.actor, Utc::now()).map_err(|error| context.fail(error))?;
    state.leave.insert(&request).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "leave.submitted",
        correlation_id = %context.correlation_id,
        leave_id = %request.id.0,
        days = request.days,
        "leave request submitted"
    );
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn balance(
    State(state): State<AppState>,
    context: RequestContext,
) -> Result<Json<LeaveBalance>, ApiError> {
    let own = state
        .leave
        .list(&RequestScope::Own(context.actor.email.clone()))
        .await
        .map_err(|error| context.fail(error))?;
    Ok(Json(LeaveBalance::compute(state.annual_leave_days, &own, &context.actor.email)))
}

pub async fn review(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(decision): Json<ReviewDecision>,
) -> Result<Json<LeaveRequest>, ApiError> {
    let result = apply_review(&state, &context, &id, decision.clone()).await;
    record_review(&state, &context, AuditCategory::Leave, &id, &decision, &result);
    result.map(Json)
}

async fn apply_review(
    state: &AppState,
    context: &RequestContext,
    id: &str,
    decision: ReviewDecision,
) -> Result<LeaveRequest, ApiError> {
    let mut request = state
        .leave
        .find_by_id(&LeaveRequestId(id.to_string()))
        .await
        .map_err(|error| context.fail(error))?
        .ok_or_else(|| context.fail(ApplicationError::not_found("leave request", id)))?;

    request.review(&context.actor, decision, Utc::now()).map_err(|error| context.fail(error))?;
    state.leave.save_review(&request).await.map_err(|error| context.fail(error))?;
    Ok(request)
}
