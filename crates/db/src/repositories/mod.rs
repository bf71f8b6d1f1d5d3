use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use thiserror::Error;

use hrdesk_core::domain::application::{ApplicationId, JobApplication};
use hrdesk_core::domain::employee::{Employee, EmployeeId};
use hrdesk_core::domain::health_check::{
    HealthCheck, HealthCheckId, HealthCheckStatus, HealthCheckSummary,
};
use hrdesk_core::domain::holiday::{Holiday, HolidayId};
use hrdesk_core::domain::job::{JobId, JobPosting, JobStatus};
use hrdesk_core::domain::leave::{LeaveRequest, LeaveRequestId};
use hrdesk_core::domain::meeting::{Meeting, MeetingId, MeetingStatus};
use hrdesk_core::domain::overtime::{OvertimeRecord, OvertimeRecordId};
use hrdesk_core::domain::review::ReviewStatus;
use hrdesk_core::domain::ringi::{FinalStatus, RingiDocument, RingiId};
use hrdesk_core::errors::ApplicationError;
use hrdesk_core::ringi::{RequestScope, StatusCounts};

pub mod application;
pub mod employee;
pub mod health_check;
pub mod holiday;
pub mod job;
pub mod leave;
pub mod meeting;
pub mod memory;
pub mod overtime;
pub mod ringi;

pub use application::SqlApplicationRepository;
pub use employee::SqlEmployeeRepository;
pub use health_check::SqlHealthCheckRepository;
pub use holiday::SqlHolidayRepository;
pub use job::SqlJobRepository;
pub use leave::SqlLeaveRepository;
pub use meeting::SqlMeetingRepository;
pub use memory::{InMemoryHolidayRepository, InMemoryRingiRepository};
pub use overtime::SqlOvertimeRepository;
pub use ringi::SqlRingiRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{entity} `{id}` was modified concurrently or is no longer open")]
    Conflict { entity: &'static str, id: String },
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} already exists: {detail}")]
    Duplicate { entity: &'static str, detail: String },
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepositoryError::Conflict { .. } | RepositoryError::Duplicate { .. } => {
                Self::Conflict(error.to_string())
            }
            RepositoryError::Database(_) | RepositoryError::Decode(_) => {
                Self::Persistence(error.to_string())
            }
        }
    }
}

#[async_trait]
pub trait RingiRepository: Send + Sync {
    async fn find_by_id(&self, id: &RingiId) -> Result<Option<RingiDocument>, RepositoryError>;

    async fn insert(&self, document: &RingiDocument) -> Result<(), RepositoryError>;

    /// Replaces the stored document only if it still carries `expected_revision` and is
    /// still pending. Fails with `Conflict` otherwise.
    async fn compare_and_swap(
        &self,
        expected_revision: i64,
        document: &RingiDocument,
    ) -> Result<(), RepositoryError>;

    async fn list(
        &self,
        scope: &RequestScope,
        status: Option<FinalStatus>,
    ) -> Result<Vec<RingiDocument>, RepositoryError>;

    async fn pending_for_approver(
        &self,
        email: &str,
    ) -> Result<Vec<RingiDocument>, RepositoryError>;

    async fn count_by_status(&self, scope: &RequestScope) -> Result<StatusCounts, RepositoryError>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Employee>, RepositoryError>;
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError>;
    async fn insert(&self, employee: &Employee) -> Result<(), RepositoryError>;
    async fn update(&self, employee: &Employee) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &EmployeeId) -> Result<bool, RepositoryError>;
    async fn count(&self) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait LeaveRepository: Send + Sync {
    async fn list(&self, scope: &RequestScope) -> Result<Vec<LeaveRequest>, RepositoryError>;
    async fn find_by_id(&self, id: &LeaveRequestId)
        -> Result<Option<LeaveRequest>, RepositoryError>;
    async fn insert(&self, request: &LeaveRequest) -> Result<(), RepositoryError>;
    /// Persists a review outcome; only a still-pending row is updated.
    async fn save_review(&self, request: &LeaveRequest) -> Result<(), RepositoryError>;
    async fn count_by_status(&self, status: ReviewStatus) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait OvertimeRepository: Send + Sync {
    async fn list(
        &self,
        scope: &RequestScope,
        month: Option<&str>,
    ) -> Result<Vec<OvertimeRecord>, RepositoryError>;
    async fn list_between(
        &self,
        employee_email: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OvertimeRecord>, RepositoryError>;
    async fn find_by_id(
        &self,
        id: &OvertimeRecordId,
    ) -> Result<Option<OvertimeRecord>, RepositoryError>;
    async fn insert(&self, record: &OvertimeRecord) -> Result<(), RepositoryError>;
    async fn save_review(&self, record: &OvertimeRecord) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &OvertimeRecordId) -> Result<bool, RepositoryError>;
    async fn count_by_status(&self, status: ReviewStatus) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait HolidayRepository: Send + Sync {
    async fn list_by_year(&self, year: i32) -> Result<Vec<Holiday>, RepositoryError>;
    async fn find_by_id(&self, id: &HolidayId) -> Result<Option<Holiday>, RepositoryError>;
    async fn insert(&self, holiday: &Holiday) -> Result<(), RepositoryError>;
    /// Inserts unless a holiday with the same date and name exists. Returns whether a row
    /// was written.
    async fn insert_if_absent(&self, holiday: &Holiday) -> Result<bool, RepositoryError>;
    async fn update(&self, holiday: &Holiday) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &HolidayId) -> Result<bool, RepositoryError>;
    async fn count_for_year(&self, year: i32) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait HealthCheckRepository: Send + Sync {
    async fn list(
        &self,
        year: Option<i32>,
        status: Option<HealthCheckStatus>,
    ) -> Result<Vec<HealthCheck>, RepositoryError>;
    async fn find_by_id(&self, id: &HealthCheckId)
        -> Result<Option<HealthCheck>, RepositoryError>;
    async fn insert(&self, check: &HealthCheck) -> Result<(), RepositoryError>;
    async fn update(&self, check: &HealthCheck) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &HealthCheckId) -> Result<bool, RepositoryError>;
    async fn summary(&self, year: Option<i32>) -> Result<HealthCheckSummary, RepositoryError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn list(&self, status: Option<JobStatus>) -> Result<Vec<JobPosting>, RepositoryError>;
    async fn find_by_id(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError>;
    async fn insert(&self, job: &JobPosting) -> Result<(), RepositoryError>;
    async fn update(&self, job: &JobPosting) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &JobId) -> Result<bool, RepositoryError>;
    async fn count_by_status(&self, status: JobStatus) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn list(
        &self,
        scope: &RequestScope,
        job_id: Option<&JobId>,
    ) -> Result<Vec<JobApplication>, RepositoryError>;
    async fn find_by_id(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<JobApplication>, RepositoryError>;
    async fn insert(&self, application: &JobApplication) -> Result<(), RepositoryError>;
    /// Persists a status change; hired or rejected rows are never overwritten.
    async fn save_status(&self, application: &JobApplication) -> Result<(), RepositoryError>;
    async fn count(&self) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait MeetingRepository: Send + Sync {
    /// `Own` scope covers meetings the email organizes or attends.
    async fn list(
        &self,
        scope: &RequestScope,
        status: Option<MeetingStatus>,
    ) -> Result<Vec<Meeting>, RepositoryError>;
    async fn find_by_id(&self, id: &MeetingId) -> Result<Option<Meeting>, RepositoryError>;
    async fn insert(&self, meeting: &Meeting) -> Result<(), RepositoryError>;
    async fn update(&self, meeting: &Meeting) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &MeetingId) -> Result<bool, RepositoryError>;
    /// Non-cancelled meetings starting in `[start, end)`.
    async fn count_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, RepositoryError>;
}

pub(crate) fn column<'r, T>(row: &'r sqlx::sqlite::SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    use sqlx::Row;
    row.try_get(name).map_err(|e| RepositoryError::Decode(e.to_string()))
}

pub(crate) fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{value}`: {e}")))
}

pub(crate) fn encode_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub(crate) fn decode_date(value: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| RepositoryError::Decode(format!("invalid date `{value}`: {e}")))
}

pub(crate) fn decode_enum<T>(
    column: &str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, RepositoryError> {
    parse(value).ok_or_else(|| RepositoryError::Decode(format!("unknown {column} `{value}`")))
}

/// Lower-cased, trimmed email used for indexed lookups.
pub(crate) fn email_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub(crate) fn map_unique_violation(
    error: sqlx::Error,
    entity: &'static str,
    detail: impl Into<String>,
) -> RepositoryError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Duplicate { entity, detail: detail.into() }
        }
        _ => RepositoryError::Database(error),
    }
}

#[cfg(test)]
mod tests {
    use hrdesk_core::errors::{ApplicationError, InterfaceErrorKind};

    use super::{email_key, RepositoryError};

    #[test]
    fn repository_errors_map_onto_application_errors() {
        let conflict: ApplicationError =
            RepositoryError::Conflict { entity: "ringi", id: "RNG-1".to_string() }.into();
        assert_eq!(conflict.into_interface("c-1").kind(), InterfaceErrorKind::Conflict);

        let duplicate: ApplicationError = RepositoryError::Duplicate {
            entity: "employee",
            detail: "email tanaka@example.co.jp".to_string(),
        }
        .into();
        assert_eq!(duplicate.into_interface("c-2").kind(), InterfaceErrorKind::Conflict);

        let missing: ApplicationError =
            RepositoryError::NotFound { entity: "holiday", id: "HOL-9".to_string() }.into();
        assert_eq!(missing, ApplicationError::not_found("holiday", "HOL-9"));

        let storage: ApplicationError = RepositoryError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(storage.into_interface("c-3").kind(), InterfaceErrorKind::ServiceUnavailable);
    }

    #[test]
    fn email_key_normalizes_case_and_padding() {
        assert_eq!(email_key("  Kacho@Example.CO.JP "), "kacho@example.co.jp");
    }
}
