use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::{same_email, Actor};
use crate::errors::DomainError;

pub const DEFAULT_DURATION_MINUTES: u32 = 60;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeetingId(pub String);

impl MeetingId {
    pub fn generate() -> Self {
        Self(format!("MTG-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(Self::Scheduled),
            "ongoing" => Some(Self::Ongoing),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: MeetingId,
    pub title: String,
    pub description: String,
    pub agenda: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub organizer_name: String,
    pub organizer_email: String,
    /// Participant emails.
    pub participants: Vec<String>,
    /// Video-call link supplied by the organizer. No conferencing provider is called.
    pub meeting_url: Option<String>,
    pub status: MeetingStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub agenda: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub meeting_url: Option<String>,
    #[serde(default)]
    pub status: MeetingStatus,
    #[serde(default)]
    pub notes: String,
}

impl MeetingInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation("meeting title is required".to_string()));
        }
        if self.duration_minutes == Some(0) {
            return Err(DomainError::Validation(
                "meeting duration must be at least one minute".to_string(),
            ));
        }
        if let Some(participant) = self.participants.iter().find(|email| !email.contains('@')) {
            return Err(DomainError::Validation(format!(
                "invalid participant email `{}`",
                participant.trim()
            )));
        }
        if let Some(url) = self.meeting_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(DomainError::Validation(format!("invalid meeting url `{url}`")));
            }
        }
        Ok(())
    }
}

impl Meeting {
    pub fn create(
        input: MeetingInput,
        organizer: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut meeting = Self {
            id: MeetingId::generate(),
            title: String::new(),
            description: String::new(),
            agenda: String::new(),
            scheduled_at: input.scheduled_at,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            organizer_name: organizer.name.trim().to_string(),
            organizer_email: organizer.email.trim().to_string(),
            participants: Vec::new(),
            meeting_url: None,
            status: MeetingStatus::default(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };
        meeting.apply(input, now)?;
        Ok(meeting)
    }

    pub fn apply(&mut self, input: MeetingInput, now: DateTime<Utc>) -> Result<(), DomainError> {
        input.validate()?;

        let mut participants: Vec<String> = Vec::with_capacity(input.participants.len());
        for email in input.participants {
            let email = email.trim().to_string();
            if !participants.iter().any(|existing| same_email(existing, &email)) {
                participants.push(email);
            }
        }

        self.title = input.title.trim().to_string();
        self.description = input.description;
        self.agenda = input.agenda;
        self.scheduled_at = input.scheduled_at;
        self.duration_minutes = input.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        self.participants = participants;
        self.meeting_url = input
            .meeting_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        self.status = input.status;
        self.notes = input.notes;
        self.updated_at = now;
        Ok(())
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.scheduled_at + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn is_organizer(&self, email: &str) -> bool {
        same_email(&self.organizer_email, email)
    }

    /// Organizer or listed participant.
    pub fn involves(&self, email: &str) -> bool {
        self.is_organizer(email) || self.participants.iter().any(|p| same_email(p, email))
    }
}

/// Half-open UTC range `[start, end)` covering one calendar day.
pub fn day_range(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{day_range, Meeting, MeetingInput, MeetingStatus, DEFAULT_DURATION_MINUTES};
    use crate::domain::identity::{Actor, Role};
    use crate::errors::DomainError;

    fn organizer() -> Actor {
        Actor::new("tanaka@example.co.jp", "Tanaka", Role::Employee)
    }

    fn input() -> MeetingInput {
        MeetingInput {
            title: "1on1".to_string(),
            description: String::new(),
            agenda: "Quarter goals".to_string(),
            scheduled_at: Utc.with_ymd_and_hms(2026, 6, 3, 1, 0, 0).single().expect("time"),
            duration_minutes: None,
            participants: vec![
                "sato@example.co.jp".to_string(),
                " SATO@example.co.jp".to_string(),
                "kacho@example.co.jp".to_string(),
            ],
            meeting_url: Some(" ".to_string()),
            status: MeetingStatus::Scheduled,
            notes: String::new(),
        }
    }

    #[test]
    fn create_defaults_duration_and_dedupes_participants() {
        let meeting = Meeting::create(input(), &organizer(), Utc::now()).expect("meeting");

        assert_eq!(meeting.duration_minutes, DEFAULT_DURATION_MINUTES);
        assert_eq!(meeting.participants, vec!["sato@example.co.jp", "kacho@example.co.jp"]);
        assert_eq!(meeting.meeting_url, None);
        assert_eq!(meeting.organizer_email, "tanaka@example.co.jp");
        assert_eq!(
            meeting.ends_at(),
            Utc.with_ymd_and_hms(2026, 6, 3, 2, 0, 0).single().expect("time")
        );
    }

    #[test]
    fn involvement_covers_organizer_and_participants() {
        let meeting = Meeting::create(input(), &organizer(), Utc::now()).expect("meeting");
        assert!(meeting.involves("Tanaka@example.co.jp"));
        assert!(meeting.involves("kacho@example.co.jp"));
        assert!(!meeting.involves("bucho@example.co.jp"));
        assert!(!meeting.is_organizer("sato@example.co.jp"));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let untitled = MeetingInput { title: "  ".to_string(), ..input() };
        assert_eq!(
            Meeting::create(untitled, &organizer(), Utc::now()),
            Err(DomainError::Validation("meeting title is required".to_string()))
        );

        let instant = MeetingInput { duration_minutes: Some(0), ..input() };
        assert!(Meeting::create(instant, &organizer(), Utc::now()).is_err());

        let stray = MeetingInput { participants: vec!["sato".to_string()], ..input() };
        assert!(Meeting::create(stray, &organizer(), Utc::now()).is_err());

        let bad_link = MeetingInput { meeting_url: Some("zoom:123".to_string()), ..input() };
        assert!(Meeting::create(bad_link, &organizer(), Utc::now()).is_err());

        let link = MeetingInput {
            meeting_url: Some("https://meet.example.co.jp/abc".to_string()),
            ..input()
        };
        let meeting = Meeting::create(link, &organizer(), Utc::now()).expect("meeting");
        assert_eq!(meeting.meeting_url.as_deref(), Some("https://meet.example.co.jp/abc"));
    }

    #[test]
    fn day_range_spans_one_utc_day() {
        let (start, end) = day_range(NaiveDate::from_ymd_opt(2026, 6, 3).expect("date"));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 6, 3, 0, 0, 0).single().expect("time"));
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 6, 4, 0, 0, 0).single().expect("time"));
    }
}
