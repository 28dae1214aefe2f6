use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::influencer::InfluencerId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingActionId(pub String);

impl PendingActionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Lifecycle of an audited destructive action. `Pending` is the only
/// non-terminal state besides `Approved`; `Approved` is reachable only from
/// `Pending`, and `Executed`/`Failed` only from `Approved`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Approved,
    Rejected,
    Executed,
    Failed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executed => "executed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "executed" => Some(Self::Executed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Executed | Self::Failed)
    }
}

pub const ACTION_TYPE_DELETE_INFLUENCER: &str = "delete_influencer";

/// Durable audit/approval record gating a destructive operation. One record
/// per resolved target; never deleted by the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: PendingActionId,
    pub action_type: String,
    pub status: ActionStatus,
    pub influencer_id: InfluencerId,
    pub influencer_name: String,
    /// JSON snapshot of the target at creation time, so the record stays
    /// meaningful after the influencer row is gone.
    pub influencer_snapshot: String,
    pub reason: String,
    pub agent_query: String,
    /// JSON of the search criteria that matched this target.
    pub criteria: String,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl PendingAction {
    fn transition(&mut self, to: ActionStatus) -> Result<(), DomainError> {
        let allowed = matches!(
            (self.status, to),
            (ActionStatus::Pending, ActionStatus::Approved)
                | (ActionStatus::Pending, ActionStatus::Rejected)
                | (ActionStatus::Approved, ActionStatus::Executed)
                | (ActionStatus::Approved, ActionStatus::Failed)
        );
        if !allowed {
            return Err(DomainError::InvalidActionTransition { from: self.status, to });
        }
        self.status = to;
        Ok(())
    }

    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(ActionStatus::Approved)?;
        self.reviewed_at = Some(now);
        Ok(())
    }

    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(ActionStatus::Rejected)?;
        self.reviewed_at = Some(now);
        Ok(())
    }

    pub fn mark_executed(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(ActionStatus::Executed)?;
        self.executed_at = Some(now);
        Ok(())
    }

    /// Execution failed; the record stays around for operator retry.
    pub fn mark_failed(
        &mut self,
        now: DateTime<Utc>,
        error_message: impl Into<String>,
    ) -> Result<(), DomainError> {
        self.transition(ActionStatus::Failed)?;
        self.executed_at = Some(now);
        self.error_message = Some(error_message.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::domain::influencer::InfluencerId;
    use crate::errors::DomainError;

    use super::{ActionStatus, PendingAction, PendingActionId, ACTION_TYPE_DELETE_INFLUENCER};

    fn pending_action() -> PendingAction {
        PendingAction {
            id: PendingActionId("act-1".to_string()),
            action_type: ACTION_TYPE_DELETE_INFLUENCER.to_string(),
            status: ActionStatus::Pending,
            influencer_id: InfluencerId("inf-1".to_string()),
            influencer_name: "Dana Reyes".to_string(),
            influencer_snapshot: "{}".to_string(),
            reason: "Requested removal of nano tier influencers".to_string(),
            agent_query: "delete all nano tier influencers".to_string(),
            criteria: "{\"tier\":\"nano\"}".to_string(),
            created_at: Utc::now(),
            reviewed_at: None,
            executed_at: None,
            error_message: None,
        }
    }

    #[test]
    fn pending_can_be_approved_then_executed() {
        let mut action = pending_action();
        action.approve(Utc::now()).expect("pending -> approved");
        assert!(action.reviewed_at.is_some());

        action.mark_executed(Utc::now()).expect("approved -> executed");
        assert_eq!(action.status, ActionStatus::Executed);
        assert!(action.executed_at.is_some());
    }

    #[test]
    fn pending_can_be_rejected() {
        let mut action = pending_action();
        action.reject(Utc::now()).expect("pending -> rejected");
        assert_eq!(action.status, ActionStatus::Rejected);
        assert!(action.status.is_terminal());
    }

    #[test]
    fn approved_failure_captures_error_and_stays_retryable_record() {
        let mut action = pending_action();
        action.approve(Utc::now()).expect("pending -> approved");
        action.mark_failed(Utc::now(), "influencer row was locked").expect("approved -> failed");

        assert_eq!(action.status, ActionStatus::Failed);
        assert_eq!(action.error_message.as_deref(), Some("influencer row was locked"));
    }

    #[test]
    fn execution_requires_prior_approval() {
        let mut action = pending_action();
        let error = action.mark_executed(Utc::now()).expect_err("pending cannot execute");
        assert!(matches!(
            error,
            DomainError::InvalidActionTransition {
                from: ActionStatus::Pending,
                to: ActionStatus::Executed
            }
        ));
    }

    #[test]
    fn terminal_states_accept_no_further_transitions() {
        for terminal in [ActionStatus::Rejected, ActionStatus::Executed, ActionStatus::Failed] {
            let mut action = pending_action();
            action.status = terminal;

            assert!(action.approve(Utc::now()).is_err());
            assert!(action.reject(Utc::now()).is_err());
            assert!(action.mark_executed(Utc::now()).is_err());
            assert!(action.mark_failed(Utc::now(), "x").is_err());
            assert_eq!(action.status, terminal, "terminal status must not move");
        }
    }

    #[test]
    fn status_round_trips_from_storage_encoding() {
        let cases = [
            ActionStatus::Pending,
            ActionStatus::Approved,
            ActionStatus::Rejected,
            ActionStatus::Executed,
            ActionStatus::Failed,
        ];
        for status in cases {
            assert_eq!(ActionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ActionStatus::parse("unknown"), None);
    }
}
