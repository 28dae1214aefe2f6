use chrono::{DateTime, Utc};
use sqlx::Row;

use roster_core::domain::influencer::InfluencerId;
use roster_core::domain::pending_action::{ActionStatus, PendingAction, PendingActionId};

use super::{PendingActionRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPendingActionRepository {
    pool: DbPool,
}

impl SqlPendingActionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_ACTION: &str = "SELECT id, action_type, status, influencer_id, influencer_name, \
     influencer_snapshot, reason, agent_query, criteria, \
     created_at, reviewed_at, executed_at, error_message \
     FROM pending_action";

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{value}`: {e}")))
}

fn parse_optional_timestamp(
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    value.as_deref().map(parse_timestamp).transpose()
}

fn row_to_action(row: &sqlx::sqlite::SqliteRow) -> Result<PendingAction, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let action_type: String =
        row.try_get("action_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_raw: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status = ActionStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown action status: {status_raw}")))?;
    let influencer_id: String =
        row.try_get("influencer_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let influencer_name: String =
        row.try_get("influencer_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let influencer_snapshot: String =
        row.try_get("influencer_snapshot").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let reason: String =
        row.try_get("reason").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let agent_query: String =
        row.try_get("agent_query").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let criteria: String =
        row.try_get("criteria").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let reviewed_at: Option<String> =
        row.try_get("reviewed_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let executed_at: Option<String> =
        row.try_get("executed_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let error_message: Option<String> =
        row.try_get("error_message").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(PendingAction {
        id: PendingActionId(id),
        action_type,
        status,
        influencer_id: InfluencerId(influencer_id),
        influencer_name,
        influencer_snapshot,
        reason,
        agent_query,
        criteria,
        created_at: parse_timestamp(&created_at)?,
        reviewed_at: parse_optional_timestamp(reviewed_at)?,
        executed_at: parse_optional_timestamp(executed_at)?,
        error_message,
    })
}

#[async_trait::async_trait]
impl PendingActionRepository for SqlPendingActionRepository {
    async fn find_by_id(
        &self,
        id: &PendingActionId,
    ) -> Result<Option<PendingAction>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_ACTION} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_action).transpose()
    }

    async fn save(&self, action: PendingAction) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO pending_action (id, action_type, status, influencer_id, \
             influencer_name, influencer_snapshot, reason, agent_query, criteria, \
             created_at, reviewed_at, executed_at, error_message) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             status = excluded.status, \
             reviewed_at = excluded.reviewed_at, \
             executed_at = excluded.executed_at, \
             error_message = excluded.error_message",
        )
        .bind(&action.id.0)
        .bind(&action.action_type)
        .bind(action.status.as_str())
        .bind(&action.influencer_id.0)
        .bind(&action.influencer_name)
        .bind(&action.influencer_snapshot)
        .bind(&action.reason)
        .bind(&action.agent_query)
        .bind(&action.criteria)
        .bind(action.created_at.to_rfc3339())
        .bind(action.reviewed_at.map(|dt| dt.to_rfc3339()))
        .bind(action.executed_at.map(|dt| dt.to_rfc3339()))
        .bind(&action.error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_by_status(
        &self,
        status: ActionStatus,
        limit: u32,
    ) -> Result<Vec<PendingAction>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{SELECT_ACTION} WHERE status = ? ORDER BY created_at DESC LIMIT ?"
        ))
        .bind(status.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_action).collect()
    }

    async fn list_for_influencer(
        &self,
        influencer_id: &InfluencerId,
    ) -> Result<Vec<PendingAction>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{SELECT_ACTION} WHERE influencer_id = ? ORDER BY created_at DESC"
        ))
        .bind(&influencer_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_action).collect()
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<PendingAction>, RepositoryError> {
        let rows =
            sqlx::query(&format!("{SELECT_ACTION} ORDER BY created_at DESC LIMIT ?"))
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(row_to_action).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use roster_core::domain::influencer::InfluencerId;
    use roster_core::domain::pending_action::{
        ActionStatus, PendingAction, PendingActionId, ACTION_TYPE_DELETE_INFLUENCER,
    };

    use super::SqlPendingActionRepository;
    use crate::connection::memory_config;
    use crate::repositories::{PendingActionRepository, RepositoryError};
    use crate::{connect, migrations};

    async fn setup() -> SqlPendingActionRepository {
        let pool = connect(&memory_config()).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlPendingActionRepository::new(pool)
    }

    fn action(id: &str, influencer_id: &str) -> PendingAction {
        PendingAction {
            id: PendingActionId(id.to_string()),
            action_type: ACTION_TYPE_DELETE_INFLUENCER.to_string(),
            status: ActionStatus::Pending,
            influencer_id: InfluencerId(influencer_id.to_string()),
            influencer_name: "Dana Reyes".to_string(),
            influencer_snapshot: "{\"name\":\"Dana Reyes\"}".to_string(),
            reason: "Requested removal of nano tier influencers".to_string(),
            agent_query: "delete all nano tier influencers".to_string(),
            criteria: "{\"tier\":\"nano\"}".to_string(),
            created_at: Utc::now(),
            reviewed_at: None,
            executed_at: None,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trips_record() {
        let repo = setup().await;
        let original = action("act-1", "inf-1");
        repo.save(original.clone()).await.expect("save");

        let loaded = repo
            .find_by_id(&PendingActionId("act-1".to_string()))
            .await
            .expect("find")
            .expect("present");

        assert_eq!(loaded.action_type, original.action_type);
        assert_eq!(loaded.status, ActionStatus::Pending);
        assert_eq!(loaded.influencer_snapshot, original.influencer_snapshot);
        assert_eq!(loaded.criteria, original.criteria);
        assert!(loaded.reviewed_at.is_none());
    }

    #[tokio::test]
    async fn save_upserts_status_and_review_fields() {
        let repo = setup().await;
        let mut record = action("act-2", "inf-1");
        repo.save(record.clone()).await.expect("save pending");

        record.approve(Utc::now()).expect("approve");
        repo.save(record.clone()).await.expect("save approved");

        record.mark_executed(Utc::now()).expect("execute");
        repo.save(record).await.expect("save executed");

        let loaded = repo
            .find_by_id(&PendingActionId("act-2".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(loaded.status, ActionStatus::Executed);
        assert!(loaded.reviewed_at.is_some());
        assert!(loaded.executed_at.is_some());
    }

    #[tokio::test]
    async fn list_by_status_filters_and_bounds() {
        let repo = setup().await;
        for index in 0..3 {
            repo.save(action(&format!("act-{index}"), "inf-1")).await.expect("save");
        }
        let mut rejected = action("act-r", "inf-2");
        rejected.reject(Utc::now()).expect("reject");
        repo.save(rejected).await.expect("save rejected");

        let pending = repo.list_by_status(ActionStatus::Pending, 2).await.expect("list");
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|a| a.status == ActionStatus::Pending));

        let rejected = repo.list_by_status(ActionStatus::Rejected, 10).await.expect("list");
        assert_eq!(rejected.len(), 1);
    }

    #[tokio::test]
    async fn records_survive_without_matching_influencer_row() {
        // influencer_id is a snapshot reference, not a foreign key; the audit
        // trail must persist after the target row is deleted.
        let repo = setup().await;
        repo.save(action("act-orphan", "inf-gone")).await.expect("save");

        let for_influencer = repo
            .list_for_influencer(&InfluencerId("inf-gone".to_string()))
            .await
            .expect("list");
        assert_eq!(for_influencer.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_review_timestamp_is_a_decode_error() {
        let pool = connect(&memory_config()).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        sqlx::query(
            "INSERT INTO pending_action (id, action_type, status, influencer_id, \
             influencer_name, influencer_snapshot, reason, agent_query, criteria, \
             created_at, reviewed_at) \
             VALUES ('act-bad', 'delete_influencer', 'approved', 'inf-1', 'Dana Reyes', \
             '{}', 'r', 'q', '{}', '2026-01-15T09:00:00+00:00', 'yesterday')",
        )
        .execute(&pool)
        .await
        .expect("insert raw row");

        let repo = SqlPendingActionRepository::new(pool);
        let error = repo
            .find_by_id(&PendingActionId("act-bad".to_string()))
            .await
            .expect_err("review timestamps must decode strictly");
        assert!(matches!(error, RepositoryError::Decode(_)));
    }

    #[tokio::test]
    async fn status_column_rejects_unknown_values() {
        let pool = connect(&memory_config()).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let result = sqlx::query(
            "INSERT INTO pending_action (id, action_type, status, influencer_id, \
             influencer_name, influencer_snapshot, reason, agent_query, criteria, created_at) \
             VALUES ('act-x', 'delete_influencer', 'archived', 'inf-1', 'Dana Reyes', \
             '{}', 'r', 'q', '{}', '2026-01-15T09:00:00+00:00')",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err(), "unknown status values must violate the check constraint");
    }

    #[tokio::test]
    async fn failed_execution_persists_error_message() {
        let repo = setup().await;
        let mut record = action("act-f", "inf-1");
        record.approve(Utc::now()).expect("approve");
        record.mark_failed(Utc::now(), "row was locked").expect("fail");
        repo.save(record).await.expect("save");

        let loaded = repo
            .find_by_id(&PendingActionId("act-f".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(loaded.status, ActionStatus::Failed);
        assert_eq!(loaded.error_message.as_deref(), Some("row was locked"));
    }
}
