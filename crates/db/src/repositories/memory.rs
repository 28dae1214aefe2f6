//! In-memory repository doubles for exercising agent flows without a
//! database. Filtering semantics mirror the SQL implementations.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use roster_core::domain::filter::SearchFilter;
use roster_core::domain::influencer::{Influencer, InfluencerId};
use roster_core::domain::pending_action::{ActionStatus, PendingAction, PendingActionId};

use super::{
    InfluencerRepository, PendingActionRepository, RepositoryError, SEARCH_PAGE_SIZE,
};

#[derive(Default)]
pub struct InMemoryInfluencerRepository {
    influencers: Mutex<Vec<Influencer>>,
    delete_count: AtomicUsize,
    fail_genres: AtomicBool,
    fail_tiers: AtomicBool,
    fail_locations: AtomicBool,
}

impl InMemoryInfluencerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_influencers(influencers: Vec<Influencer>) -> Self {
        Self { influencers: Mutex::new(influencers), ..Self::default() }
    }

    /// Number of delete calls observed, regardless of whether a row matched.
    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    pub fn fail_genre_listing(&self) {
        self.fail_genres.store(true, Ordering::SeqCst);
    }

    pub fn fail_tier_listing(&self) {
        self.fail_tiers.store(true, Ordering::SeqCst);
    }

    pub fn fail_location_sampling(&self) {
        self.fail_locations.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Influencer>> {
        self.influencers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn matches(influencer: &Influencer, filter: &SearchFilter) -> bool {
    if let Some(genre) = &filter.genre {
        if influencer.profile.genre.as_deref() != Some(genre.as_str()) {
            return false;
        }
    }
    if let Some(tier) = &filter.tier {
        if influencer.profile.tier.as_deref() != Some(tier.as_str()) {
            return false;
        }
    }
    if let Some(location) = &filter.location {
        let needle = location.to_lowercase();
        match &influencer.profile.location {
            Some(value) if value.to_lowercase().contains(&needle) => {}
            _ => return false,
        }
    }
    if let Some(name) = &filter.name {
        if !influencer.name.to_lowercase().contains(&name.to_lowercase()) {
            return false;
        }
    }
    if let Some(max_price_cents) = filter.max_price_cents {
        if !influencer.price_points.iter().any(|p| p.price_cents <= max_price_cents) {
            return false;
        }
    }
    true
}

#[async_trait::async_trait]
impl InfluencerRepository for InMemoryInfluencerRepository {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Influencer>, RepositoryError> {
        let mut results: Vec<Influencer> =
            self.lock().iter().filter(|i| matches(i, filter)).cloned().collect();
        results.sort_by(|a, b| a.name.cmp(&b.name));
        results.truncate(SEARCH_PAGE_SIZE as usize);
        Ok(results)
    }

    async fn find_by_id(&self, id: &InfluencerId) -> Result<Option<Influencer>, RepositoryError> {
        Ok(self.lock().iter().find(|i| &i.id == id).cloned())
    }

    async fn insert(&self, influencer: Influencer) -> Result<(), RepositoryError> {
        self.lock().push(influencer);
        Ok(())
    }

    async fn delete(&self, id: &InfluencerId) -> Result<u64, RepositoryError> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        let mut influencers = self.lock();
        let before = influencers.len();
        influencers.retain(|i| &i.id != id);
        Ok((before - influencers.len()) as u64)
    }

    async fn list_genre_names(&self) -> Result<Vec<String>, RepositoryError> {
        if self.fail_genres.load(Ordering::SeqCst) {
            return Err(RepositoryError::Decode("genre listing unavailable".to_string()));
        }
        let mut names: Vec<String> =
            self.lock().iter().filter_map(|i| i.profile.genre.clone()).collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn list_tier_names(&self) -> Result<Vec<String>, RepositoryError> {
        if self.fail_tiers.load(Ordering::SeqCst) {
            return Err(RepositoryError::Decode("tier listing unavailable".to_string()));
        }
        let mut names: Vec<String> =
            self.lock().iter().filter_map(|i| i.profile.tier.clone()).collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn sample_locations(
        &self,
        cap: usize,
    ) -> Result<(Vec<String>, bool), RepositoryError> {
        if self.fail_locations.load(Ordering::SeqCst) {
            return Err(RepositoryError::Decode("location sampling unavailable".to_string()));
        }
        let mut locations: Vec<String> = self
            .lock()
            .iter()
            .filter_map(|i| i.profile.location.clone())
            .filter(|l| !l.is_empty())
            .collect();
        locations.sort();
        locations.dedup();
        let truncated = locations.len() > cap;
        locations.truncate(cap);
        Ok((locations, truncated))
    }
}

#[derive(Default)]
pub struct InMemoryPendingActionRepository {
    actions: Mutex<Vec<PendingAction>>,
}

impl InMemoryPendingActionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PendingAction>> {
        self.actions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl PendingActionRepository for InMemoryPendingActionRepository {
    async fn find_by_id(
        &self,
        id: &PendingActionId,
    ) -> Result<Option<PendingAction>, RepositoryError> {
        Ok(self.lock().iter().find(|a| &a.id == id).cloned())
    }

    async fn save(&self, action: PendingAction) -> Result<(), RepositoryError> {
        let mut actions = self.lock();
        if let Some(existing) = actions.iter_mut().find(|a| a.id == action.id) {
            *existing = action;
        } else {
            actions.push(action);
        }
        Ok(())
    }

    async fn list_by_status(
        &self,
        status: ActionStatus,
        limit: u32,
    ) -> Result<Vec<PendingAction>, RepositoryError> {
        let mut actions: Vec<PendingAction> =
            self.lock().iter().filter(|a| a.status == status).cloned().collect();
        actions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        actions.truncate(limit as usize);
        Ok(actions)
    }

    async fn list_for_influencer(
        &self,
        influencer_id: &InfluencerId,
    ) -> Result<Vec<PendingAction>, RepositoryError> {
        let mut actions: Vec<PendingAction> = self
            .lock()
            .iter()
            .filter(|a| &a.influencer_id == influencer_id)
            .cloned()
            .collect();
        actions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(actions)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<PendingAction>, RepositoryError> {
        let mut actions: Vec<PendingAction> = self.lock().clone();
        actions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        actions.truncate(limit as usize);
        Ok(actions)
    }
}
