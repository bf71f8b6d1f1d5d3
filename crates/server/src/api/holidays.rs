use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use tracing::info;

use hrdesk_core::domain::holiday::{Holiday, HolidayId, HolidayInput};
use hrdesk_core::errors::{ApplicationError, DomainError};

use super::{ApiError, AppState, RequestContext};

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<String>,
}

/// Stored holidays of one year in date order; defaults to the current year.
pub async fn calendar(
    State(state): State<AppState>,
    context: RequestContext,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<Holiday>>, ApiError> {
    let year = match query.year.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => raw.parse::<i32>().map_err(|_| {
            context.fail(DomainError::Validation(format!("year `{raw}` is not a number")))
        })?,
        None => Utc::now().year(),
    };

    let holidays = state.holidays.list_by_year(year).await.map_err(|error| context.fail(error))?;
    Ok(Json(holidays))
}

pub async fn create(
    State(state): State<AppState>,
    context: RequestContext,
    Json(input): Json<HolidayInput>,
) -> Result<(StatusCode, Json<Holiday>), ApiError> {
    context.require_staff("manage holidays")?;
    let holiday = Holiday::create(input, &context.actor.email, Utc::now())
        .map_err(|error| context.fail(error))?;
    state.holidays.insert(&holiday).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "holiday.created",
        correlation_id = %context.correlation_id,
        holiday_id = %holiday.id.0,
        date = %holiday.date,
        "holiday added"
    );
    Ok((StatusCode::CREATED, Json(holiday)))
}

pub async fn update(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(input): Json<HolidayInput>,
) -> Result<Json<Holiday>, ApiError> {
    context.require_staff("manage holidays")?;
    let mut holiday = state
        .holidays
        .find_by_id(&HolidayId(id.clone()))
        .await
        .map_err(|error| context.fail(error))?
        .ok_or_else(|| context.fail(ApplicationError::not_found("holiday", id)))?;

    holiday.apply(input, Utc::now()).map_err(|error| context.fail(error))?;
    state.holidays.update(&holiday).await.map_err(|error| context.fail(error))?;
    Ok(Json(holiday))
}

pub async fn remove(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    context.require_staff("manage holidays")?;
    if !state.holidays.delete(&HolidayId(id.clone())).await.map_err(|error| context.fail(error))? {
        return Err(context.fail(ApplicationError::not_found("holiday", id)));
    }

    info!(
        event_name = "holiday.deleted",
        correlation_id = %context.correlation_id,
        holiday_id = %id,
        "holiday removed"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{app, call, ADMIN, HR, TANAKA};

    #[tokio::test]
    async fn calendar_lists_one_year_in_date_order() {
        let app = app().await;
        for (date, name) in [("2027-12-29", "年末休暇"), ("2027-08-13", "夏季休暇"), ("2026-12-30", "年末")]
        {
            let (status, _) = call(
                &app,
                "POST",
                "/api/v1/holidays",
                HR,
                Some(json!({"date": date, "name": name})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, calendar) = call(&app, "GET", "/api/v1/holidays?year=2027", TANAKA, None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = calendar
            .as_array()
            .expect("array")
            .iter()
            .map(|holiday| holiday["name"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["夏季休暇", "年末休暇"]);
        assert_eq!(calendar[0]["kind"], "company");
        assert_eq!(calendar[0]["createdBy"], HR.0);

        let (status, _) = call(&app, "GET", "/api/v1/holidays?year=next", TANAKA, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn only_staff_change_the_calendar() {
        let app = app().await;
        let body = json!({"date": "2027-05-07", "name": "創立記念日", "description": "Founding day"});

        let (status, _) = call(&app, "POST", "/api/v1/holidays", TANAKA, Some(body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, created) = call(&app, "POST", "/api/v1/holidays", ADMIN, Some(body.clone())).await;
        let uri = format!("/api/v1/holidays/{}", created["id"].as_str().expect("id"));

        let (status, _) = call(&app, "POST", "/api/v1/holidays", ADMIN, Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT, "same date and name twice");

        let moved = json!({"date": "2028-05-08", "name": "創立記念日"});
        let (status, updated) = call(&app, "PUT", &uri, HR, Some(moved)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["year"], 2028);

        let (status, _) = call(&app, "DELETE", &uri, TANAKA, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, "DELETE", &uri, HR, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "DELETE", &uri, HR, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
