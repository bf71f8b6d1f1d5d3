//! Single-step approve/reject review shared by leave requests and overtime records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::identity::{Actor, Role};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub status: ReviewStatus,
    pub reviewed_by: String,
    pub rejection_reason: Option<String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("record was already reviewed ({})", status.as_str())]
    AlreadyReviewed { status: ReviewStatus },
    #[error("a rejection reason is required")]
    ReasonRequired,
    #[error("role `{}` may not review this record", role.as_str())]
    NotPermitted { role: Role },
}

/// Resolves a review decision against the current status and the reviewer's role.
pub fn resolve(
    current: ReviewStatus,
    reviewer: &Actor,
    decision: ReviewDecision,
    permitted: impl Fn(Role) -> bool,
) -> Result<ReviewOutcome, ReviewError> {
    if !permitted(reviewer.role) {
        return Err(ReviewError::NotPermitted { role: reviewer.role });
    }
    if current != ReviewStatus::Pending {
        return Err(ReviewError::AlreadyReviewed { status: current });
    }

    match decision {
        ReviewDecision::Approve => Ok(ReviewOutcome {
            status: ReviewStatus::Approved,
            reviewed_by: reviewer.name.clone(),
            rejection_reason: None,
        }),
        ReviewDecision::Reject { reason } => {
            let reason = reason.trim();
            if reason.is_empty() {
                return Err(ReviewError::ReasonRequired);
            }
            Ok(ReviewOutcome {
                status: ReviewStatus::Rejected,
                reviewed_by: reviewer.name.clone(),
                rejection_reason: Some(reason.to_string()),
            })
        }
    }
}
