use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn generate() -> Self {
        Self(format!("JOB-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullTime => "full-time",
            Self::PartTime => "part-time",
            Self::Contract => "contract",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "full-time" => Some(Self::FullTime),
            "part-time" => Some(Self::PartTime),
            "contract" => Some(Self::Contract),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Active,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// An open (or closed) position on the recruiting board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: JobId,
    pub title: String,
    pub department: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub salary: Option<Decimal>,
    pub description: String,
    pub requirements: String,
    pub status: JobStatus,
    pub posted_by: String,
    pub posted_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPostingInput {
    pub title: String,
    pub department: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub salary: Option<Decimal>,
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub status: JobStatus,
}

impl JobPostingInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("title", &self.title),
            ("department", &self.department),
            ("description", &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!("job {field} is required")));
            }
        }
        if self.salary.is_some_and(|salary| salary.is_sign_negative() && !salary.is_zero()) {
            return Err(DomainError::Validation("salary must not be negative".to_string()));
        }
        Ok(())
    }
}

impl JobPosting {
    pub fn create(
        input: JobPostingInput,
        posted_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        input.validate()?;
        Ok(Self {
            id: JobId::generate(),
            title: input.title.trim().to_string(),
            department: input.department.trim().to_string(),
            location: input.location.trim().to_string(),
            employment_type: input.employment_type,
            salary: input.salary,
            description: input.description.trim().to_string(),
            requirements: input.requirements,
            status: input.status,
            posted_by: posted_by.trim().to_string(),
            posted_date: now,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable fields. The posting date and author stay as first recorded.
    pub fn apply(&mut self, input: JobPostingInput, now: DateTime<Utc>) -> Result<(), DomainError> {
        input.validate()?;
        self.title = input.title.trim().to_string();
        self.department = input.department.trim().to_string();
        self.location = input.location.trim().to_string();
        self.employment_type = input.employment_type;
        self.salary = input.salary;
        self.description = input.description.trim().to_string();
        self.requirements = input.requirements;
        self.status = input.status;
        self.updated_at = now;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{EmploymentType, JobPosting, JobPostingInput, JobStatus};
    use crate::errors::DomainError;

    fn input() -> JobPostingInput {
        JobPostingInput {
            title: " Backend Engineer ".to_string(),
            department: "開発部".to_string(),
            location: "東京".to_string(),
            employment_type: EmploymentType::FullTime,
            salary: Some(Decimal::new(6_000_000, 0)),
            description: "Payments platform".to_string(),
            ..JobPostingInput::default()
        }
    }

    #[test]
    fn create_trims_and_stamps_the_posting_date() {
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).single().expect("time");
        let job = JobPosting::create(input(), "jinji@example.co.jp", now).expect("job");

        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.status, JobStatus::Active);
        assert_eq!(job.posted_date, now);
        assert!(job.is_open());
    }

    #[test]
    fn title_department_and_description_are_required() {
        for field in ["title", "department", "description"] {
            let mut bad = input();
            match field {
                "title" => bad.title = "  ".to_string(),
                "department" => bad.department.clear(),
                _ => bad.description = "\n".to_string(),
            }
            assert_eq!(
                JobPosting::create(bad, "jinji@example.co.jp", Utc::now()),
                Err(DomainError::Validation(format!("job {field} is required")))
            );
        }
    }

    #[test]
    fn negative_salary_is_rejected() {
        let mut bad = input();
        bad.salary = Some(Decimal::new(-1, 0));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn closing_keeps_the_original_posting_date() {
        let posted = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).single().expect("time");
        let mut job = JobPosting::create(input(), "jinji@example.co.jp", posted).expect("job");

        let later = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).single().expect("time");
        job.apply(JobPostingInput { status: JobStatus::Closed, ..input() }, later).expect("apply");
        assert_eq!(job.posted_date, posted);
        assert_eq!(job.updated_at, later);
        assert!(!job.is_open());
    }

    #[test]
    fn employment_type_uses_hyphenated_names() {
        assert_eq!(EmploymentType::parse("part-time"), Some(EmploymentType::PartTime));
        assert_eq!(
            serde_json::to_value(EmploymentType::FullTime).expect("json"),
            serde_json::json!("full-time")
        );
        assert_eq!(EmploymentType::parse("intern"), None);
    }
}
