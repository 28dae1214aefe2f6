use async_trait::async_trait;
use thiserror::Error;

use roster_core::domain::filter::SearchFilter;
use roster_core::domain::influencer::{Influencer, InfluencerId};
use roster_core::domain::pending_action::{ActionStatus, PendingAction, PendingActionId};

pub mod influencer;
pub mod memory;
pub mod pending_action;

pub use influencer::SqlInfluencerRepository;
pub use memory::{InMemoryInfluencerRepository, InMemoryPendingActionRepository};
pub use pending_action::SqlPendingActionRepository;

/// Hard cap on rows returned by a filtered read, regardless of match count.
pub const SEARCH_PAGE_SIZE: i64 = 10;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait InfluencerRepository: Send + Sync {
    /// Filtered read: the conjunction of exactly the clauses present on the
    /// filter, capped at [`SEARCH_PAGE_SIZE`] rows.
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Influencer>, RepositoryError>;

    async fn find_by_id(&self, id: &InfluencerId) -> Result<Option<Influencer>, RepositoryError>;

    async fn insert(&self, influencer: Influencer) -> Result<(), RepositoryError>;

    /// Deletes one influencer row (profile and price points cascade).
    /// Returns the number of rows removed. Only the approval gate's executor
    /// may call this.
    async fn delete(&self, id: &InfluencerId) -> Result<u64, RepositoryError>;

    async fn list_genre_names(&self) -> Result<Vec<String>, RepositoryError>;

    async fn list_tier_names(&self) -> Result<Vec<String>, RepositoryError>;

    /// Up to `cap` distinct non-empty locations plus a flag indicating more
    /// exist beyond the cap.
    async fn sample_locations(&self, cap: usize)
        -> Result<(Vec<String>, bool), RepositoryError>;
}

#[async_trait]
pub trait PendingActionRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &PendingActionId,
    ) -> Result<Option<PendingAction>, RepositoryError>;

    /// Upsert: one crash-safe single-row write per record.
    async fn save(&self, action: PendingAction) -> Result<(), RepositoryError>;

    async fn list_by_status(
        &self,
        status: ActionStatus,
        limit: u32,
    ) -> Result<Vec<PendingAction>, RepositoryError>;

    async fn list_for_influencer(
        &self,
        influencer_id: &InfluencerId,
    ) -> Result<Vec<PendingAction>, RepositoryError>;

    async fn list_recent(&self, limit: u32) -> Result<Vec<PendingAction>, RepositoryError>;
}
