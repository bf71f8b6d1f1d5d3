use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use hrdesk_core::domain::identity::Role;
use hrdesk_core::domain::meeting::{Meeting, MeetingId, MeetingInput, MeetingStatus};
use hrdesk_core::errors::{ApplicationError, DomainError};
use hrdesk_core::ringi::RequestScope;

use super::{ApiError, AppState, RequestContext};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// Staff see every meeting; everyone else sees what they organize or attend.
pub async fn list(
    State(state): State<AppState>,
    context: RequestContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Meeting>>, ApiError> {
    let status = match query.status.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(MeetingStatus::parse(raw).ok_or_else(|| {
            context.fail(DomainError::Validation(format!("unknown meeting status `{raw}`")))
        })?),
        None => None,
    };

    let meetings = state
        .meetings
        .list(&RequestScope::for_actor(&context.actor), status)
        .await
        .map_err(|error| context.fail(error))?;
    Ok(Json(meetings))
}

/// The caller becomes the organizer.
pub async fn create(
    State(state): State<AppState>,
    context: RequestContext,
    Json(input): Json<MeetingInput>,
) -> Result<(StatusCode, Json<Meeting>), ApiError> {
    if context.actor.role == Role::Applicant {
        return Err(context.forbid("schedule meetings"));
    }
    let meeting =
        Meeting::create(input, &context.actor, Utc::now()).map_err(|error| context.fail(error))?;
    state.meetings.insert(&meeting).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "meeting.scheduled",
        correlation_id = %context.correlation_id,
        meeting_id = %meeting.id.0,
        scheduled_at = %meeting.scheduled_at,
        participants = meeting.participants.len(),
        "meeting scheduled"
    );
    Ok((StatusCode::CREATED, Json(meeting)))
}

pub async fn fetch(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Meeting>, ApiError> {
    let meeting = load(&state, &context, &id).await?;
    if !context.actor.role.sees_all_records() && !meeting.involves(&context.actor.email) {
        return Err(context.forbid("view this meeting"));
    }
    Ok(Json(meeting))
}

pub async fn update(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(input): Json<MeetingInput>,
) -> Result<Json<Meeting>, ApiError> {
    let mut meeting = load(&state, &context, &id).await?;
    require_organizer(&context, &meeting, "edit this meeting")?;
    meeting.apply(input, Utc::now()).map_err(|error| context.fail(error))?;
    state.meetings.update(&meeting).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "meeting.updated",
        correlation_id = %context.correlation_id,
        meeting_id = %meeting.id.0,
        status = meeting.status.as_str(),
        "meeting updated"
    );
    Ok(Json(meeting))
}

pub async fn remove(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let meeting = load(&state, &context, &id).await?;
    require_organizer(&context, &meeting, "delete this meeting")?;
    let deleted = state.meetings.delete(&meeting.id).await.map_err(|error| context.fail(error))?;
    if !deleted {
        return Err(context.fail(ApplicationError::not_found("meeting", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn require_organizer(
    context: &RequestContext,
    meeting: &Meeting,
    action: &str,
) -> Result<(), ApiError> {
    if context.actor.role.sees_all_records() || meeting.is_organizer(&context.actor.email) {
        Ok(())
    } else {
        Err(context.forbid(action))
    }
}

async fn load(state: &AppState, context: &RequestContext, id: &str) -> Result<Meeting, ApiError> {
    state
        .meetings
        .find_by_id(&MeetingId(id.to_string()))
        .await
        .map_err(|error| context.fail(error))?
        .ok_or_else(|| context.fail(ApplicationError::not_found("meeting", id)))
}
