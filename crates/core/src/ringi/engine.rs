use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::identity::{same_email, Actor};
use crate::domain::ringi::{
    ApproverEntry, Cancellation, Decision, FinalStatus, Hanko, NewRingi, Requester,
    RingiDocument, RingiId, DEFAULT_CATEGORY,
};
use crate::errors::DomainError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("ringi is already {status}")]
    AlreadyFinal { status: FinalStatus },
    #[error("approver index {index} is outside a chain of {len}")]
    ApproverOutOfRange { index: usize, len: usize },
    #[error("approver {requested} acted out of turn; approver {expected} is next")]
    OutOfTurn { expected: usize, requested: usize },
    #[error("actor is not the designated approver at position {index}")]
    NotDesignatedApprover { index: usize },
    #[error("only the requester may cancel a ringi")]
    NotRequester,
}

/// One approver's decision as submitted by the acting identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionInput {
    pub approver_index: usize,
    pub decision: Decision,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub hanko: Option<Hanko>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionKind {
    Decided { index: usize, decision: Decision },
    Cancelled,
}

/// The document after a successful mutation, plus the revision it must replace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingiTransition {
    pub document: RingiDocument,
    pub expected_revision: i64,
    pub from: FinalStatus,
    pub to: FinalStatus,
    pub kind: TransitionKind,
}

impl RingiTransition {
    /// Index of the approver who acts next, if the ringi stays open.
    pub fn advanced_to(&self) -> Option<usize> {
        match self.kind {
            TransitionKind::Decided { index, decision: Decision::Approved }
                if self.to == FinalStatus::Pending =>
            {
                Some(index + 1)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RingiWorkflow;

impl RingiWorkflow {
    pub fn new() -> Self {
        Self
    }

    pub fn create(
        &self,
        input: NewRingi,
        requester: &Actor,
        now: DateTime<Utc>,
    ) -> Result<RingiDocument, DomainError> {
        let title = required("title", &input.title)?;
        let purpose = required("purpose", &input.purpose)?;
        let details = required("details", &input.details)?;
        if input.approvers.is_empty() {
            return Err(DomainError::Validation(
                "approval chain needs at least one approver".to_owned(),
            ));
        }
        if let Some(amount) = input.amount {
            if amount < Decimal::ZERO {
                return Err(DomainError::Validation("amount must not be negative".to_owned()));
            }
        }

        let approval_chain = input
            .approvers
            .into_iter()
            .enumerate()
            .map(|(position, approver)| -> Result<ApproverEntry, DomainError> {
                let field = |name: &str| format!("approvers[{position}].{name}");
                Ok(ApproverEntry::new(
                    required(&field("name"), &approver.name)?,
                    required(&field("email"), &approver.email)?,
                    required(&field("position"), &approver.position)?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let category = input
            .category
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned());

        Ok(RingiDocument {
            id: RingiId::generate(),
            title,
            category,
            purpose,
            details,
            amount: input.amount,
            requester: Requester { name: requester.name.clone(), email: requester.email.clone() },
            request_date: now.date_naive(),
            approval_chain,
            current_approver: 0,
            final_status: FinalStatus::Pending,
            urgency: input.urgency.unwrap_or_default(),
            cancellation: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies one approver's decision. The input document is left untouched on error.
    pub fn decide(
        &self,
        current: &RingiDocument,
        actor: &Actor,
        input: DecisionInput,
        now: DateTime<Utc>,
    ) -> Result<RingiTransition, DomainError> {
        if current.final_status.is_terminal() {
            return Err(WorkflowError::AlreadyFinal { status: current.final_status }.into());
        }
        let index = input.approver_index;
        let len = current.approval_chain.len();
        if index >= len {
            return Err(WorkflowError::ApproverOutOfRange { index, len }.into());
        }
        if index != current.current_approver {
            return Err(WorkflowError::OutOfTurn {
                expected: current.current_approver,
                requested: index,
            }
            .into());
        }
        if !same_email(&current.approval_chain[index].email, &actor.email) {
            return Err(WorkflowError::NotDesignatedApprover { index }.into());
        }

        let mut document = current.clone();
        let entry = &mut document.approval_chain[index];
        entry.status = input.decision.approver_status();
        entry.approved_at = Some(now);
        entry.comment =
            input.comment.map(|comment| comment.trim().to_owned()).filter(|c| !c.is_empty());
        entry.hanko = match input.decision {
            Decision::Approved => {
                Some(input.hanko.unwrap_or_else(|| Hanko::digital(entry.name.clone(), now)))
            }
            Decision::Rejected => None,
        };

        match input.decision {
            Decision::Rejected => document.final_status = FinalStatus::Rejected,
            Decision::Approved if current.is_last_position(index) => {
                document.final_status = FinalStatus::Approved;
            }
            Decision::Approved => document.current_approver = index + 1,
        }

        Ok(finish(current, document, TransitionKind::Decided { index, decision: input.decision }, now))
    }

    pub fn decide_with_audit<S>(
        &self,
        current: &RingiDocument,
        actor: &Actor,
        input: DecisionInput,
        now: DateTime<Utc>,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<RingiTransition, DomainError>
    where
        S: AuditSink + ?Sized,
    {
        let index = input.approver_index;
        let decision = input.decision;
        let result = self.decide(current, actor, input, now);
        match &result {
            Ok(transition) => sink.emit(
                AuditEvent::new(
                    audit,
                    "ringi.decision_applied",
                    AuditCategory::Ringi,
                    AuditOutcome::Success,
                )
                .with_metadata("index", index.to_string())
                .with_metadata("decision", decision.as_str())
                .with_metadata("from", transition.from.as_str())
                .with_metadata("to", transition.to.as_str()),
            ),
            Err(error) => sink.emit(
                AuditEvent::new(
                    audit,
                    "ringi.decision_rejected",
                    AuditCategory::Ringi,
                    AuditOutcome::Rejected,
                )
                .with_metadata("index", index.to_string())
                .with_metadata("decision", decision.as_str())
                .with_metadata("error", error.to_string()),
            ),
        }
        result
    }

    /// Withdraws a pending ringi. Approver entries keep whatever they recorded.
    pub fn cancel(
        &self,
        current: &RingiDocument,
        actor: &Actor,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<RingiTransition, DomainError> {
        if !same_email(&current.requester.email, &actor.email) {
            return Err(WorkflowError::NotRequester.into());
        }
        if current.final_status.is_terminal() {
            return Err(WorkflowError::AlreadyFinal { status: current.final_status }.into());
        }
        let reason = required("cancellation reason", reason)?;

        let mut document = current.clone();
        document.final_status = FinalStatus::Cancelled;
        document.cancellation = Some(Cancellation { reason, cancelled_at: now });

        Ok(finish(current, document, TransitionKind::Cancelled, now))
    }

    pub fn cancel_with_audit<S>(
        &self,
        current: &RingiDocument,
        actor: &Actor,
        reason: &str,
        now: DateTime<Utc>,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<RingiTransition, DomainError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.cancel(current, actor, reason, now);
        let event = match &result {
            Ok(_) => AuditEvent::new(
                audit,
                "ringi.cancelled",
                AuditCategory::Ringi,
                AuditOutcome::Success,
            )
            .with_metadata("reason", reason.trim()),
            Err(error) => AuditEvent::new(
                audit,
                "ringi.cancel_rejected",
                AuditCategory::Ringi,
                AuditOutcome::Rejected,
            )
            .with_metadata("error", error.to_string()),
        };
        sink.emit(event);
        result
    }
}

fn finish(
    current: &RingiDocument,
    mut document: RingiDocument,
    kind: TransitionKind,
    now: DateTime<Utc>,
) -> RingiTransition {
    document.revision = current.revision + 1;
    document.updated_at = now;
    RingiTransition {
        from: current.final_status,
        to: document.final_status,
        expected_revision: current.revision,
        document,
        kind,
    }
}

fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    Ok(value.to_owned())
}
