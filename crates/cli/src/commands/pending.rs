use std::sync::Arc;

use crate::commands::{block_on_pool, CommandResult};
use roster_agent::ApprovalGate;
use roster_core::domain::pending_action::{ActionStatus, PendingAction, PendingActionId};
use roster_db::repositories::{
    PendingActionRepository, SqlInfluencerRepository, SqlPendingActionRepository,
};

enum PendingOp {
    List { status: Option<ActionStatus>, limit: u32 },
    Approve(PendingActionId),
    Reject(PendingActionId),
    Execute(PendingActionId),
}

pub fn list(status: Option<&str>, limit: u32) -> CommandResult {
    let status = match status {
        Some(raw) => match ActionStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return CommandResult::failure(
                    "pending",
                    "invalid_status",
                    format!("unknown status `{raw}` (expected pending|approved|rejected|executed|failed)"),
                    2,
                );
            }
        },
        None => None,
    };
    run_op(PendingOp::List { status, limit })
}

pub fn approve(id: &str) -> CommandResult {
    run_op(PendingOp::Approve(PendingActionId(id.to_string())))
}

pub fn reject(id: &str) -> CommandResult {
    run_op(PendingOp::Reject(PendingActionId(id.to_string())))
}

pub fn execute(id: &str) -> CommandResult {
    run_op(PendingOp::Execute(PendingActionId(id.to_string())))
}

fn run_op(op: PendingOp) -> CommandResult {
    let result = block_on_pool("pending", |pool, _config| async move {
        let influencers = Arc::new(SqlInfluencerRepository::new(pool.clone()));
        let actions = Arc::new(SqlPendingActionRepository::new(pool));
        let gate = ApprovalGate::new(influencers, actions.clone());

        let message = match op {
            PendingOp::List { status, limit } => {
                let records = match status {
                    Some(status) => actions.list_by_status(status, limit).await,
                    None => actions.list_recent(limit).await,
                }
                .map_err(|error| ("repository", error.to_string(), 5u8))?;
                render_list(&records)
            }
            PendingOp::Approve(id) => {
                let action =
                    gate.approve(&id).await.map_err(|error| ("gate", error.to_string(), 5u8))?;
                format!("approved action {} targeting {}", action.id.0, action.influencer_name)
            }
            PendingOp::Reject(id) => {
                let action =
                    gate.reject(&id).await.map_err(|error| ("gate", error.to_string(), 5u8))?;
                format!("rejected action {} targeting {}", action.id.0, action.influencer_name)
            }
            PendingOp::Execute(id) => {
                let action =
                    gate.execute(&id).await.map_err(|error| ("gate", error.to_string(), 5u8))?;
                match action.status {
                    ActionStatus::Executed => format!(
                        "executed action {}: deleted {}",
                        action.id.0, action.influencer_name
                    ),
                    _ => format!(
                        "execution of action {} failed: {}",
                        action.id.0,
                        action.error_message.unwrap_or_else(|| "unknown error".to_string())
                    ),
                }
            }
        };

        Ok(message)
    });

    match result {
        Ok(message) => CommandResult::success("pending", message),
        Err(failure) => failure,
    }
}

fn render_list(records: &[PendingAction]) -> String {
    if records.is_empty() {
        return "no pending actions found".to_string();
    }

    let mut lines = vec![format!("{} action(s):", records.len())];
    for record in records {
        lines.push(format!(
            "- {} [{}] {} target={} created={}",
            record.id.0,
            record.status.as_str(),
            record.action_type,
            record.influencer_name,
            record.created_at.to_rfc3339(),
        ));
    }
    lines.join("\n")
}
