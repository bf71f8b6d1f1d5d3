//! Read-side views over ringi documents. Storage backends narrow the candidate set with
//! indexes; these functions decide membership.

use serde::{Deserialize, Serialize};

use crate::domain::identity::{same_email, Actor};
use crate::domain::ringi::{ApproverStatus, FinalStatus, RingiDocument};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestScope {
    All,
    Own(String),
}

impl RequestScope {
    pub fn for_actor(actor: &Actor) -> Self {
        if actor.role.sees_all_records() {
            Self::All
        } else {
            Self::Own(actor.email.clone())
        }
    }

    pub fn includes(&self, document: &RingiDocument) -> bool {
        match self {
            Self::All => true,
            Self::Own(email) => same_email(&document.requester.email, email),
        }
    }
}

/// True when `email` holds the active slot of an open ringi.
pub fn is_pending_for(document: &RingiDocument, email: &str) -> bool {
    document.active_approver().is_some_and(|entry| {
        entry.status == ApproverStatus::Pending && same_email(&entry.email, email)
    })
}

pub fn pending_for_approver(documents: Vec<RingiDocument>, email: &str) -> Vec<RingiDocument> {
    let mut pending: Vec<_> =
        documents.into_iter().filter(|document| is_pending_for(document, email)).collect();
    sort_newest_first(&mut pending);
    pending
}

pub fn filter_by_status(
    documents: Vec<RingiDocument>,
    status: Option<FinalStatus>,
    scope: &RequestScope,
) -> Vec<RingiDocument> {
    let mut matched: Vec<_> = documents
        .into_iter()
        .filter(|document| scope.includes(document))
        .filter(|document| status.map_or(true, |status| document.final_status == status))
        .collect();
    sort_newest_first(&mut matched);
    matched
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: FinalStatus, count: usize) {
        match status {
            FinalStatus::Pending => self.pending += count,
            FinalStatus::Approved => self.approved += count,
            FinalStatus::Rejected => self.rejected += count,
            FinalStatus::Cancelled => self.cancelled += count,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.approved + self.rejected + self.cancelled
    }
}

pub fn count_by_status<'a>(
    documents: impl IntoIterator<Item = &'a RingiDocument>,
    scope: &RequestScope,
) -> StatusCounts {
    documents.into_iter().filter(|document| scope.includes(document)).fold(
        StatusCounts::default(),
        |mut counts, document| {
            counts.record(document.final_status, 1);
            counts
        },
    )
}

fn sort_newest_first(documents: &mut [RingiDocument]) {
    documents.sort_by(|left, right| {
        right.created_at.cmp(&left.created_at).then_with(|| right.id.0.cmp(&left.id.0))
    });
}
