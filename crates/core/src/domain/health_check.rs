use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthCheckId(pub String);

impl HealthCheckId {
    pub fn generate() -> Self {
        Self(format!("HC-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCheckStatus {
    #[default]
    Scheduled,
    Completed,
    Pending,
    RecheckRequired,
}

impl HealthCheckStatus {
    pub const ALL: [Self; 4] =
        [Self::Scheduled, Self::Completed, Self::Pending, Self::RecheckRequired];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::RecheckRequired => "recheck_required",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            "recheck_required" => Some(Self::RecheckRequired),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub id: HealthCheckId,
    pub employee_id: String,
    pub employee_name: String,
    pub employee_email: String,
    pub scheduled_date: NaiveDate,
    pub completed_date: Option<NaiveDate>,
    pub status: HealthCheckStatus,
    pub report_submitted: bool,
    pub notes: String,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckInput {
    #[serde(default)]
    pub employee_id: String,
    pub employee_name: String,
    #[serde(default)]
    pub employee_email: String,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub completed_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: HealthCheckStatus,
    #[serde(default)]
    pub report_submitted: bool,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to the year of `scheduled_date`.
    #[serde(default)]
    pub year: Option<i32>,
}

impl HealthCheck {
    pub fn create(input: HealthCheckInput, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let mut check = Self {
            id: HealthCheckId::generate(),
            employee_id: String::new(),
            employee_name: String::new(),
            employee_email: String::new(),
            scheduled_date: input.scheduled_date,
            completed_date: None,
            status: HealthCheckStatus::default(),
            report_submitted: false,
            notes: String::new(),
            year: input.scheduled_date.year(),
            created_at: now,
            updated_at: now,
        };
        check.apply(input, now)?;
        Ok(check)
    }

    pub fn apply(&mut self, input: HealthCheckInput, now: DateTime<Utc>) -> Result<(), DomainError> {
        let employee_name = input.employee_name.trim();
        if employee_name.is_empty() {
            return Err(DomainError::Validation("employee name is required".to_string()));
        }
        if let Some(completed) = input.completed_date {
            if completed < input.scheduled_date {
                return Err(DomainError::Validation(
                    "completed date must not precede the scheduled date".to_string(),
                ));
            }
        }

        self.employee_id = input.employee_id.trim().to_string();
        self.employee_name = employee_name.to_string();
        self.employee_email = input.employee_email.trim().to_string();
        self.scheduled_date = input.scheduled_date;
        self.completed_date = input.completed_date;
        self.status = input.status;
        self.report_submitted = input.report_submitted;
        self.notes = input.notes.unwrap_or_default();
        self.year = input.year.unwrap_or_else(|| input.scheduled_date.year());
        self.updated_at = now;
        Ok(())
    }

    pub fn complete(&mut self, on: NaiveDate, now: DateTime<Utc>) {
        self.status = HealthCheckStatus::Completed;
        self.completed_date = Some(on);
        self.updated_at = now;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckSummary {
    pub scheduled: usize,
    pub completed: usize,
    pub pending: usize,
    pub recheck_required: usize,
    pub total: usize,
}

impl HealthCheckSummary {
    pub fn compute<'a>(checks: impl IntoIterator<Item = &'a HealthCheck>) -> Self {
        checks.into_iter().fold(Self::default(), |mut summary, check| {
            summary.record(check.status, 1);
            summary
        })
    }

    pub fn record(&mut self, status: HealthCheckStatus, count: usize) {
        match status {
            HealthCheckStatus::Scheduled => self.scheduled += count,
            HealthCheckStatus::Completed => self.completed += count,
            HealthCheckStatus::Pending => self.pending += count,
            HealthCheckStatus::RecheckRequired => self.recheck_required += count,
        }
        self.total += count;
    }
}
