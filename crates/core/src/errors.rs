use thiserror::Error;

use crate::domain::pending_action::ActionStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid pending action transition from {from:?} to {to:?}")]
    InvalidActionTransition { from: ActionStatus, to: ActionStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}
