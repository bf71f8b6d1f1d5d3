use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use hrdesk_core::audit::AuditCategory;
use hrdesk_core::domain::overtime::{
    is_month_prefix, NewOvertimeRecord, OvertimeRecord, OvertimeRecordId, OvertimeStats,
};
use hrdesk_core::domain::review::{ReviewDecision, ReviewStatus};
use hrdesk_core::errors::{ApplicationError, DomainError};
use hrdesk_core::ringi::RequestScope;

use super::{record_review, ApiError, AppState, RequestContext};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    context: RequestContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OvertimeRecord>>, ApiError> {
    let month = query.month.as_deref().map(str::trim).filter(|month| !month.is_empty());
    if let Some(month) = month {
        if !is_month_prefix(month) {
            return Err(context.fail(DomainError::Validation(format!(
                "month `{month}` must look like YYYY-MM"
            ))));
        }
    }

    let records = state
        .overtime
        .list(&RequestScope::for_actor(&context.actor), month)
        .await
        .map_err(|error| context.fail(error))?;
    Ok(Json(records))
}

pub async fn create(
    State(state): State<AppState>,
    context: RequestContext,
    Json(input): Json<NewOvertimeRecord>,
) -> Result<(StatusCode, Json<OvertimeRecord>), ApiError> {
    let record = OvertimeRecord::submit(input, &context.actor, Utc::now())
        .map_err(|error| context.fail(error))?;
    state.overtime.insert(&record).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "overtime.submitted",
        correlation_id = %context.correlation_id,
        overtime_id = %record.id.0,
        hours = %record.hours,
        "overtime recorded"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// The caller's own hours between `from` and `to`, both inclusive.
pub async fn stats(
    State(state): State<AppState>,
    context: RequestContext,
    Query(query): Query<StatsQuery>,
) -> Result<Json<OvertimeStats>, ApiError> {
    let from = parse_day(&context, "from", query.from.as_deref())?;
    let to = parse_day(&context, "to", query.to.as_deref())?;
    if to < from {
        return Err(context.fail(DomainError::Validation(
            "`to` must not precede `from`".to_string(),
        )));
    }

    let records = state
        .overtime
        .list_between(&context.actor.email, from, to)
        .await
        .map_err(|error| context.fail(error))?;
    Ok(Json(OvertimeStats::compute(&records, from, to)))
}

fn parse_day(context: &RequestContext, name: &str, raw: Option<&str>) -> Result<NaiveDate, ApiError> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty()).ok_or_else(|| {
        context.fail(DomainError::Validation(format!("query parameter `{name}` is required")))
    })?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        context.fail(DomainError::Validation(format!("`{name}` must be a YYYY-MM-DD date")))
    })
}

pub async fn review(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(decision): Json<ReviewDecision>,
) -> Result<Json<OvertimeRecord>, ApiError> {
    let result = apply_review(&state, &context, &id, decision.clone()).await;
    record_review(&state, &context, AuditCategory::Overtime, &id, &decision, &result);
    result.map(Json)
}

async fn apply_review(
    state: &AppState,
    context: &RequestContext,
    id: &str,
    decision: ReviewDecision,
) -> Result<OvertimeRecord, ApiError> {
    let mut record = load(state, context, id).await?;
    record.review(&context.actor, decision, Utc::now()).map_err(|error| context.fail(error))?;
    state.overtime.save_review(&record).await.map_err(|error| context.fail(error))?;
    Ok(record)
}

/// Staff may delete any record; owners only withdraw records still awaiting review.
pub async fn remove(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let record = load(&state, &context, &id).await?;
    if !context.actor.role.sees_all_records() {
        if !context.actor.is(&record.employee_email) {
            return Err(context.forbid("delete another employee's overtime"));
        }
        if record.status != ReviewStatus::Pending {
            return Err(context.fail(ApplicationError::Conflict(format!(
                "overtime record `{id}` was already {}",
                record.status.as_str()
            ))));
        }
    }

    if !state.overtime.delete(&record.id).await.map_err(|error| context.fail(error))? {
        return Err(context.fail(ApplicationError::not_found("overtime record", id)));
    }
    info!(
        event_name = "overtime.deleted",
        correlation_id = %context.correlation_id,
        overtime_id = %id,
        "overtime record deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn load(
    state: &AppState,
    context: &RequestContext,
    id: &str,
) -> Result<OvertimeRecord, ApiError> {
    state
        .overtime
        .find_by_id(&OvertimeRecordId(id.to_string()))
        .await
        .map_err(|error| context.fail(error))?
        .ok_or_else(|| context.fail(ApplicationError::not_found("overtime record", id)))
}
