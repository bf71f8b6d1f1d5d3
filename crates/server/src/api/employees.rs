use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use hrdesk_core::domain::employee::{Employee, EmployeeId, EmployeeInput};
use hrdesk_core::errors::ApplicationError;

use super::{ApiError, AppState, RequestContext};

pub async fn list(
    State(state): State<AppState>,
    context: RequestContext,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let employees = state.employees.list().await.map_err(|error| context.fail(error))?;
    Ok(Json(employees))
}

pub async fn fetch(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    let employee = state
        .employees
        .find_by_id(&EmployeeId(id.clone()))
        .await
        .map_err(|error| context.fail(error))?
        .ok_or_else(|| context.fail(ApplicationError::not_found("employee", id)))?;
    Ok(Json(employee))
}

pub async fn create(
    State(state): State<AppState>,
    context: RequestContext,
    Json(input): Json<EmployeeInput>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    context.require_staff("register employees")?;
    let employee = Employee::create(input, Utc::now()).map_err(|error| context.fail(error))?;
    state.employees.insert(&employee).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "employee.created",
        correlation_id = %context.correlation_id,
        employee_id = %employee.id.0,
        "employee registered"
    );
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn update(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(input): Json<EmployeeInput>,
) -> Result<Json<Employee>, ApiError> {
    context.require_staff("edit employees")?;
    let mut employee = state
        .employees
        .find_by_id(&EmployeeId(id.clone()))
        .await
        .map_err(|error| context.fail(error))?
        .ok_or_else(|| context.fail(ApplicationError::not_found("employee", id)))?;

    employee.apply(input, Utc::now()).map_err(|error| context.fail(error))?;
    state.employees.update(&employee).await.map_err(|error| context.fail(error))?;

    info!(
        event_name = "employee.updated",
        correlation_id = %context.correlation_id,
        employee_id = %employee.id.0,
        "employee updated"
    );
    Ok(Json(employee))
}

pub async fn remove(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    context.require_staff("delete employees")?;
    let deleted =
        state.employees.delete(&EmployeeId(id.clone())).await.map_err(|error| context.fail(error))?;
    if !deleted {
        return Err(context.fail(ApplicationError::not_found("employee", id)));
    }

    info!(
        event_name = "employee.deleted",
        correlation_id = %context.correlation_id,
        employee_id = %id,
        "employee deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
