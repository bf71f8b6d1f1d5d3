use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::{JobId, JobPosting};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(format!("APP-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Interview,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Interview => "interview",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "reviewed" => Some(Self::Reviewed),
            "interview" => Some(Self::Interview),
            "hired" => Some(Self::Hired),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Hired | Self::Rejected)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: String,
    pub cover_letter: String,
    /// Opaque pointer to an uploaded CV; file storage lives outside this service.
    pub cv_reference: Option<String>,
    pub status: ApplicationStatus,
    pub review_notes: String,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub applicant_name: String,
    /// Defaults to the submitting identity's email.
    #[serde(default)]
    pub applicant_email: String,
    #[serde(default)]
    pub applicant_phone: String,
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub cv_reference: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl JobApplication {
    /// Files an application against an open posting.
    pub fn submit(
        job: &JobPosting,
        input: NewApplication,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !job.is_open() {
            return Err(DomainError::Validation(format!(
                "job `{}` is not accepting applications",
                job.id.0
            )));
        }
        let applicant_name = input.applicant_name.trim();
        if applicant_name.is_empty() {
            return Err(DomainError::Validation("applicant name is required".to_string()));
        }
        let applicant_email = input.applicant_email.trim();
        if applicant_email.is_empty() || !applicant_email.contains('@') {
            return Err(DomainError::Validation(format!(
                "invalid applicant email `{applicant_email}`"
            )));
        }

        Ok(Self {
            id: ApplicationId::generate(),
            job_id: job.id.clone(),
            applicant_name: applicant_name.to_string(),
            applicant_email: applicant_email.to_string(),
            applicant_phone: input.applicant_phone.trim().to_string(),
            cover_letter: input.cover_letter,
            cv_reference: input
                .cv_reference
                .map(|reference| reference.trim().to_string())
                .filter(|reference| !reference.is_empty()),
            status: ApplicationStatus::Pending,
            review_notes: String::new(),
            applied_at: now,
            updated_at: now,
        })
    }

    /// Moves the application along the hiring pipeline. Returns false, leaving the
    /// record untouched, once it has been hired or rejected.
    pub fn change_status(&mut self, change: StatusChange, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = change.status;
        if let Some(notes) = change.notes {
            self.review_notes = notes.trim().to_string();
        }
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{ApplicationStatus, JobApplication, NewApplication, StatusChange};
    use crate::domain::job::{JobPosting, JobPostingInput, JobStatus};
    use crate::errors::DomainError;

    fn job(status: JobStatus) -> JobPosting {
        JobPosting::create(
            JobPostingInput {
                title: "Accountant".to_string(),
                department: "経理部".to_string(),
                description: "Month-end close".to_string(),
                status,
                ..JobPostingInput::default()
            },
            "jinji@example.co.jp",
            Utc::now(),
        )
        .expect("job")
    }

    fn application() -> NewApplication {
        NewApplication {
            applicant_name: " Mori Ken ".to_string(),
            applicant_email: "mori@example.com".to_string(),
            cv_reference: Some("  ".to_string()),
            ..NewApplication::default()
        }
    }

    #[test]
    fn submission_starts_pending_against_the_job() {
        let job = job(JobStatus::Active);
        let submitted = JobApplication::submit(&job, application(), Utc::now()).expect("submit");

        assert_eq!(submitted.job_id, job.id);
        assert_eq!(submitted.applicant_name, "Mori Ken");
        assert_eq!(submitted.status, ApplicationStatus::Pending);
        assert_eq!(submitted.cv_reference, None);
    }

    #[test]
    fn closed_jobs_and_missing_contact_details_are_refused() {
        assert!(JobApplication::submit(&job(JobStatus::Closed), application(), Utc::now()).is_err());

        let nameless = NewApplication { applicant_name: " ".to_string(), ..application() };
        assert_eq!(
            JobApplication::submit(&job(JobStatus::Active), nameless, Utc::now()),
            Err(DomainError::Validation("applicant name is required".to_string()))
        );

        let bad_email = NewApplication { applicant_email: "mori".to_string(), ..application() };
        assert!(JobApplication::submit(&job(JobStatus::Active), bad_email, Utc::now()).is_err());
    }

    #[test]
    fn hired_and_rejected_are_final() {
        let mut submitted =
            JobApplication::submit(&job(JobStatus::Active), application(), Utc::now())
                .expect("submit");

        let interview =
            StatusChange { status: ApplicationStatus::Interview, notes: Some(" round 1 ".into()) };
        assert!(submitted.change_status(interview, Utc::now()));
        assert_eq!(submitted.review_notes, "round 1");

        assert!(submitted.change_status(
            StatusChange { status: ApplicationStatus::Hired, notes: None },
            Utc::now()
        ));
        assert!(!submitted.change_status(
            StatusChange { status: ApplicationStatus::Pending, notes: None },
            Utc::now()
        ));
        assert_eq!(submitted.status, ApplicationStatus::Hired);
        assert_eq!(submitted.review_notes, "round 1");
    }
}
