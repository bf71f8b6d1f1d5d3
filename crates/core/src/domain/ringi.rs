use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CATEGORY: &str = "経費申請";
pub const HANKO_KIND_DIGITAL: &str = "digital";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RingiId(pub String);

impl RingiId {
    pub fn generate() -> Self {
        Self(format!("RNG-{}", Uuid::new_v4().simple()))
    }
}

impl fmt::Display for RingiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn approver_status(&self) -> ApproverStatus {
        match self {
            Self::Approved => ApproverStatus::Approved,
            Self::Rejected => ApproverStatus::Rejected,
        }
    }
}

/// Overall outcome of a ringi. Every variant except `Pending` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl FinalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Digital seal recorded when an approver approves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hanko {
    pub approver_name: String,
    pub stamped_at: DateTime<Utc>,
    pub kind: String,
}

impl Hanko {
    pub fn digital(approver_name: impl Into<String>, stamped_at: DateTime<Utc>) -> Self {
        Self {
            approver_name: approver_name.into(),
            stamped_at,
            kind: HANKO_KIND_DIGITAL.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproverEntry {
    pub name: String,
    pub email: String,
    pub position: String,
    pub status: ApproverStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub comment: Option<String>,
    pub hanko: Option<Hanko>,
}

impl ApproverEntry {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            position: position.into(),
            status: ApproverStatus::Pending,
            approved_at: None,
            comment: None,
            hanko: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingiDocument {
    pub id: RingiId,
    pub title: String,
    pub category: String,
    pub purpose: String,
    pub details: String,
    pub amount: Option<Decimal>,
    pub requester: Requester,
    pub request_date: NaiveDate,
    pub approval_chain: Vec<ApproverEntry>,
    pub current_approver: usize,
    pub final_status: FinalStatus,
    pub urgency: Urgency,
    pub cancellation: Option<Cancellation>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RingiDocument {
    /// The entry whose decision is expected next, if the ringi is still open.
    pub fn active_approver(&self) -> Option<&ApproverEntry> {
        if self.final_status.is_terminal() {
            return None;
        }
        self.approval_chain.get(self.current_approver)
    }

    pub fn active_approver_email(&self) -> Option<&str> {
        self.active_approver().map(|entry| entry.email.as_str())
    }

    pub fn is_last_position(&self, index: usize) -> bool {
        index + 1 == self.approval_chain.len()
    }
}

/// Submission payload for a new ringi; the requester comes from the acting identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRingi {
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    pub purpose: String,
    pub details: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub approvers: Vec<NewApprover>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApprover {
    pub name: String,
    pub email: String,
    pub position: String,
}
