use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use roster_core::domain::filter::SearchFilter;
use roster_core::domain::influencer::Influencer;
use roster_core::domain::pending_action::{
    ActionStatus, PendingAction, PendingActionId, ACTION_TYPE_DELETE_INFLUENCER,
};
use roster_core::errors::DomainError;
use roster_db::repositories::{
    InfluencerRepository, PendingActionRepository, RepositoryError,
};

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("could not serialize action payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("pending action not found: {0}")]
    NotFound(String),
}

/// Intercepts destructive intents. The search path never deletes; rows are
/// removed only by `execute` on a record a reviewer has approved.
pub struct ApprovalGate {
    influencers: Arc<dyn InfluencerRepository>,
    actions: Arc<dyn PendingActionRepository>,
}

impl ApprovalGate {
    pub fn new(
        influencers: Arc<dyn InfluencerRepository>,
        actions: Arc<dyn PendingActionRepository>,
    ) -> Self {
        Self { influencers, actions }
    }

    /// Resolve the target set for a destructive intent and create one pending
    /// record per target. The destructive flag is stripped before target
    /// resolution so it cannot influence the predicate.
    pub async fn intercept(
        &self,
        query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<PendingAction>, GateError> {
        let criteria = filter.without_destructive();
        let targets = self.influencers.search(&criteria).await?;
        let criteria_json = serde_json::to_string(&criteria)?;
        let now = Utc::now();

        let mut created = Vec::with_capacity(targets.len());
        for target in targets {
            let action = pending_record(query, &criteria_json, &target, now)?;
            self.actions.save(action.clone()).await?;
            tracing::info!(
                event_name = "gate.pending_created",
                action_id = %action.id.0,
                influencer = %action.influencer_name,
            );
            created.push(action);
        }
        Ok(created)
    }

    pub async fn approve(&self, id: &PendingActionId) -> Result<PendingAction, GateError> {
        let mut action = self.load(id).await?;
        action.approve(Utc::now())?;
        self.actions.save(action.clone()).await?;
        Ok(action)
    }

    pub async fn reject(&self, id: &PendingActionId) -> Result<PendingAction, GateError> {
        let mut action = self.load(id).await?;
        action.reject(Utc::now())?;
        self.actions.save(action.clone()).await?;
        Ok(action)
    }

    /// Execute an approved record: delete the target, then mark the record
    /// executed. A delete failure marks the record failed with the captured
    /// message and keeps it for operator retry.
    pub async fn execute(&self, id: &PendingActionId) -> Result<PendingAction, GateError> {
        let mut action = self.load(id).await?;
        // The delete must not run unless a reviewer approved the record.
        if action.status != ActionStatus::Approved {
            return Err(GateError::Domain(DomainError::InvalidActionTransition {
                from: action.status,
                to: ActionStatus::Executed,
            }));
        }
        let now = Utc::now();

        match self.influencers.delete(&action.influencer_id).await {
            Ok(_removed) => {
                action.mark_executed(now)?;
            }
            Err(error) => {
                tracing::error!(
                    event_name = "gate.execution_failed",
                    action_id = %action.id.0,
                    %error,
                );
                action.mark_failed(now, error.to_string())?;
            }
        }

        self.actions.save(action.clone()).await?;
        Ok(action)
    }

    async fn load(&self, id: &PendingActionId) -> Result<PendingAction, GateError> {
        self.actions
            .find_by_id(id)
            .await?
            .ok_or_else(|| GateError::NotFound(id.0.clone()))
    }
}

fn pending_record(
    query: &str,
    criteria_json: &str,
    target: &Influencer,
    now: chrono::DateTime<Utc>,
) -> Result<PendingAction, serde_json::Error> {
    Ok(PendingAction {
        id: PendingActionId::generate(),
        action_type: ACTION_TYPE_DELETE_INFLUENCER.to_string(),
        status: ActionStatus::Pending,
        influencer_id: target.id.clone(),
        influencer_name: target.name.clone(),
        influencer_snapshot: serde_json::to_string(target)?,
        reason: format!("Deletion requested by query: \"{query}\""),
        agent_query: query.to_string(),
        criteria: criteria_json.to_string(),
        created_at: now,
        reviewed_at: None,
        executed_at: None,
        error_message: None,
    })
}
