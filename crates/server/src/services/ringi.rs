use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use hrdesk_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use hrdesk_core::domain::identity::{same_email, Actor};
use hrdesk_core::domain::ringi::{FinalStatus, NewRingi, RingiDocument, RingiId};
use hrdesk_core::errors::ApplicationError;
use hrdesk_core::ringi::{DecisionInput, RequestScope, RingiTransition, RingiWorkflow, StatusCounts};
use hrdesk_db::repositories::{RepositoryError, RingiRepository};

/// Read, decide, compare-and-swap. Each call is one isolated attempt; a lost race
/// surfaces as a conflict and is never retried here.
#[derive(Clone)]
pub struct RingiService {
    repository: Arc<dyn RingiRepository>,
    audit: Arc<dyn AuditSink>,
    workflow: RingiWorkflow,
}

impl RingiService {
    pub fn new(repository: Arc<dyn RingiRepository>, audit: Arc<dyn AuditSink>) -> Self {
        Self { repository, audit, workflow: RingiWorkflow::new() }
    }

    pub async fn create(
        &self,
        input: NewRingi,
        actor: &Actor,
        correlation_id: &str,
    ) -> Result<RingiDocument, ApplicationError> {
        let document = self.workflow.create(input, actor, Utc::now())?;
        self.repository.insert(&document).await?;

        let context = AuditContext::new(Some(document.id.0.clone()), correlation_id, &actor.email);
        self.audit.emit(
            AuditEvent::new(&context, "ringi.created", AuditCategory::Ringi, AuditOutcome::Success)
                .with_metadata("approvers", document.approval_chain.len().to_string())
                .with_metadata("urgency", document.urgency.as_str()),
        );
        info!(
            event_name = "ringi.created",
            correlation_id,
            ringi_id = %document.id.0,
            approvers = document.approval_chain.len(),
            "ringi submitted"
        );
        Ok(document)
    }

    /// Staff, the requester and anyone on the approval chain may read a ringi.
    pub async fn get(&self, id: &RingiId, actor: &Actor) -> Result<RingiDocument, ApplicationError> {
        let document = self.load(id).await?;
        let involved = same_email(&document.requester.email, &actor.email)
            || document.approval_chain.iter().any(|entry| same_email(&entry.email, &actor.email));
        if actor.role.sees_all_records() || involved {
            Ok(document)
        } else {
            Err(ApplicationError::Forbidden(format!("ringi `{}` is not visible to this user", id.0)))
        }
    }

    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<FinalStatus>,
    ) -> Result<Vec<RingiDocument>, ApplicationError> {
        Ok(self.repository.list(&RequestScope::for_actor(actor), status).await?)
    }

    pub async fn pending_for(&self, actor: &Actor) -> Result<Vec<RingiDocument>, ApplicationError> {
        Ok(self.repository.pending_for_approver(&actor.email).await?)
    }

    pub async fn counts(&self, scope: &RequestScope) -> Result<StatusCounts, ApplicationError> {
        Ok(self.repository.count_by_status(scope).await?)
    }

    pub async fn decide(
        &self,
        id: &RingiId,
        actor: &Actor,
        input: DecisionInput,
        correlation_id: &str,
    ) -> Result<RingiDocument, ApplicationError> {
        let current = self.load(id).await?;
        let context = AuditContext::new(Some(id.0.clone()), correlation_id, &actor.email);
        let transition = self.workflow.decide_with_audit(
            &current,
            actor,
            input,
            Utc::now(),
            self.audit.as_ref(),
            &context,
        )?;
        self.commit(transition, &context).await
    }

    pub async fn cancel(
        &self,
        id: &RingiId,
        actor: &Actor,
        reason: &str,
        correlation_id: &str,
    ) -> Result<RingiDocument, ApplicationError> {
        let current = self.load(id).await?;
        let context = AuditContext::new(Some(id.0.clone()), correlation_id, &actor.email);
        let transition = self.workflow.cancel_with_audit(
            &current,
            actor,
            reason,
            Utc::now(),
            self.audit.as_ref(),
            &context,
        )?;
        self.commit(transition, &context).await
    }

    async fn load(&self, id: &RingiId) -> Result<RingiDocument, ApplicationError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("ringi", id.0.clone()))
    }

    async fn commit(
        &self,
        transition: RingiTransition,
        context: &AuditContext,
    ) -> Result<RingiDocument, ApplicationError> {
        match self.repository.compare_and_swap(transition.expected_revision, &transition.document).await
        {
            Ok(()) => {
                info!(
                    event_name = "ringi.transition.persisted",
                    correlation_id = %context.correlation_id,
                    ringi_id = %transition.document.id.0,
                    from = transition.from.as_str(),
                    to = transition.to.as_str(),
                    revision = transition.document.revision,
                    current_approver = transition.document.current_approver,
                    "ringi transition persisted"
                );
                Ok(transition.document)
            }
            Err(error @ RepositoryError::Conflict { .. }) => {
                warn!(
                    event_name = "ringi.transition.conflict",
                    correlation_id = %context.correlation_id,
                    ringi_id = %transition.document.id.0,
                    expected_revision = transition.expected_revision,
                    "ringi changed since it was read"
                );
                self.audit.emit(
                    AuditEvent::new(
                        context,
                        "ringi.write_conflict",
                        AuditCategory::Persistence,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("expected_revision", transition.expected_revision.to_string()),
                );
                Err(error.into())
            }
            Err(error) => Err(error.into()),
        }
    }
}
