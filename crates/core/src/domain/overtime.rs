use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::{same_email, Actor};
use crate::domain::review::{self, ReviewDecision, ReviewStatus};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OvertimeRecordId(pub String);

impl OvertimeRecordId {
    pub fn generate() -> Self {
        Self(format!("OT-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OvertimeType {
    #[default]
    Weekday,
    Weekend,
    Holiday,
}

impl OvertimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekday => "weekday",
            Self::Weekend => "weekend",
            Self::Holiday => "holiday",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "weekday" => Some(Self::Weekday),
            "weekend" => Some(Self::Weekend),
            "holiday" => Some(Self::Holiday),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compensation {
    #[default]
    #[serde(rename = "pay")]
    Pay,
    #[serde(rename = "time-off")]
    TimeOff,
}

impl Compensation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pay => "pay",
            Self::TimeOff => "time-off",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pay" => Some(Self::Pay),
            "time-off" => Some(Self::TimeOff),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeRecord {
    pub id: OvertimeRecordId,
    pub employee_id: String,
    pub employee_name: String,
    pub employee_email: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub hours: Decimal,
    pub overtime_type: OvertimeType,
    pub compensation: Compensation,
    pub reason: String,
    pub status: ReviewStatus,
    pub reviewed_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOvertimeRecord {
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub employee_email: Option<String>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub overtime_type: OvertimeType,
    #[serde(default)]
    pub compensation: Compensation,
    pub reason: String,
}

/// Hours between two clock times, rounded to two decimals. `None` unless the span is positive.
pub fn span_hours(start: NaiveTime, end: NaiveTime) -> Option<Decimal> {
    let minutes = end.signed_duration_since(start).num_minutes();
    if minutes <= 0 {
        return None;
    }
    Some((Decimal::from(minutes) / Decimal::from(60)).round_dp(2))
}

/// Accepts `YYYY-MM` month prefixes.
pub fn is_month_prefix(value: &str) -> bool {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").is_ok() && value.len() == 7
}

impl OvertimeRecord {
    pub fn submit(
        input: NewOvertimeRecord,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(DomainError::Validation("overtime reason is required".to_string()));
        }
        let hours = span_hours(input.start_time, input.end_time).ok_or_else(|| {
            DomainError::Validation("overtime end time must be after its start time".to_string())
        })?;

        let employee_email = match input.employee_email.filter(|_| actor.role.sees_all_records())
        {
            Some(email) if !email.trim().is_empty() => email.trim().to_string(),
            _ => actor.email.clone(),
        };
        let employee_name = input
            .employee_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| actor.name.clone());

        Ok(Self {
            id: OvertimeRecordId::generate(),
            employee_id: input.employee_id.unwrap_or_default(),
            employee_name,
            employee_email,
            date: input.date,
            start_time: input.start_time,
            end_time: input.end_time,
            hours,
            overtime_type: input.overtime_type,
            compensation: input.compensation,
            reason: reason.to_string(),
            status: ReviewStatus::Pending,
            reviewed_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn review(
        &mut self,
        reviewer: &Actor,
        decision: ReviewDecision,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let outcome =
            review::resolve(self.status, reviewer, decision, |role| role.sees_all_records())?;
        self.status = outcome.status;
        self.reviewed_by = Some(outcome.reviewed_by);
        self.rejection_reason = outcome.rejection_reason;
        self.updated_at = now;
        Ok(())
    }

    pub fn in_month(&self, month: &str) -> bool {
        self.date.format("%Y-%m").to_string() == month
    }

    pub fn visible_to(&self, actor: &Actor) -> bool {
        actor.role.sees_all_records() || same_email(&self.employee_email, &actor.email)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeStats {
    pub total_hours: Decimal,
    pub weekday_hours: Decimal,
    pub weekend_hours: Decimal,
    pub holiday_hours: Decimal,
    pub total_records: usize,
}

impl OvertimeStats {
    /// Sums hours of every record dated within `from..=to`, regardless of review status.
    pub fn compute<'a>(
        records: impl IntoIterator<Item = &'a OvertimeRecord>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Self {
        records.into_iter().filter(|record| record.date >= from && record.date <= to).fold(
            Self::default(),
            |mut stats, record| {
                stats.total_hours += record.hours;
                match record.overtime_type {
                    OvertimeType::Weekday => stats.weekday_hours += record.hours,
                    OvertimeType::Weekend => stats.weekend_hours += record.hours,
                    OvertimeType::Holiday => stats.holiday_hours += record.hours,
                }
                stats.total_records += 1;
                stats
            },
        )
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}
