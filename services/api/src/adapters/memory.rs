//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the store ports. Selected with
//! `DATABASE_URL=memory://` for local runs and used by the integration tests.

use async_trait::async_trait;
use progress_core::domain::{Badge, BadgeDraft, LeaderboardEntry, LearnerProgress};
use progress_core::leaderboard;
use progress_core::ports::{BadgeCatalog, LearnerStore, PortError, PortResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

struct StoredLearner {
    display_name: String,
    progress: LearnerProgress,
}

/// Learners keyed by id, badges kept in insertion order.
///
/// Every committed learner write republishes the full ranking on `standings`, so
/// leaderboard reads take a snapshot and never wait on the learners lock.
pub struct MemoryStore {
    learners: RwLock<HashMap<Uuid, StoredLearner>>,
    badges: RwLock<Vec<Badge>>,
    standings: watch::Sender<Arc<Vec<LeaderboardEntry>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let (standings, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            learners: RwLock::default(),
            badges: RwLock::default(),
            standings,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the learners write lock held, so snapshots publish in commit order.
    fn publish_standings(&self, learners: &HashMap<Uuid, StoredLearner>) {
        let entries = learners
            .values()
            .map(|l| LeaderboardEntry {
                learner_id: l.progress.learner_id,
                display_name: l.display_name.clone(),
                total_xp: l.progress.total_xp,
            })
            .collect();
        self.standings
            .send_replace(Arc::new(leaderboard::rank(entries, usize::MAX)));
    }
}

#[async_trait]
impl LearnerStore for MemoryStore {
    async fn create_learner(
        &self,
        learner_id: Uuid,
        display_name: &str,
    ) -> PortResult<LearnerProgress> {
        let mut learners = self.learners.write().await;
        if learners.contains_key(&learner_id) {
            return Err(PortError::Conflict(format!(
                "Learner {} already exists",
                learner_id
            )));
        }
        let progress = LearnerProgress::new(learner_id);
        learners.insert(
            learner_id,
            StoredLearner {
                display_name: display_name.to_string(),
                progress: progress.clone(),
            },
        );
        self.publish_standings(&learners);
        Ok(progress)
    }

    async fn get_progress(&self, learner_id: Uuid) -> PortResult<LearnerProgress> {
        self.learners
            .read()
            .await
            .get(&learner_id)
            .map(|l| l.progress.clone())
            .ok_or_else(|| PortError::NotFound(format!("Learner {} not found", learner_id)))
    }

    async fn save_progress(&self, progress: &LearnerProgress) -> PortResult<LearnerProgress> {
        progress.validate()?;
        let mut learners = self.learners.write().await;
        let stored = learners.get_mut(&progress.learner_id).ok_or_else(|| {
            PortError::NotFound(format!("Learner {} not found", progress.learner_id))
        })?;
        if stored.progress.version != progress.version {
            return Err(PortError::Conflict(format!(
                "Learner {} was modified concurrently",
                progress.learner_id
            )));
        }
        let mut saved = progress.clone();
        saved.version += 1;
        let xp_changed = stored.progress.total_xp != saved.total_xp;
        stored.progress = saved.clone();
        if xp_changed {
            self.publish_standings(&learners);
        }
        Ok(saved)
    }

    async fn top_by_xp(&self, limit: usize) -> PortResult<Vec<LeaderboardEntry>> {
        let standings = self.standings.borrow().clone();
        Ok(standings.iter().take(limit).cloned().collect())
    }
}

#[async_trait]
impl BadgeCatalog for MemoryStore {
    async fn list_badges(&self) -> PortResult<Vec<Badge>> {
        Ok(self.badges.read().await.clone())
    }

    async fn get_badge(&self, badge_id: Uuid) -> PortResult<Badge> {
        self.badges
            .read()
            .await
            .iter()
            .find(|b| b.id == badge_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Badge {} not found", badge_id)))
    }

    async fn create_badge(&self, draft: BadgeDraft) -> PortResult<Badge> {
        draft.validate()?;
        let badge = draft.into_badge(Uuid::new_v4());
        self.badges.write().await.push(badge.clone());
        Ok(badge)
    }

    async fn update_badge(&self, badge_id: Uuid, draft: BadgeDraft) -> PortResult<Badge> {
        draft.validate()?;
        let mut badges = self.badges.write().await;
        let slot = badges
            .iter_mut()
            .find(|b| b.id == badge_id)
            .ok_or_else(|| PortError::NotFound(format!("Badge {} not found", badge_id)))?;
        *slot = draft.into_badge(badge_id);
        Ok(slot.clone())
    }

    async fn delete_badge(&self, badge_id: Uuid) -> PortResult<()> {
        let mut badges = self.badges.write().await;
        let before = badges.len();
        badges.retain(|b| b.id != badge_id);
        if badges.len() == before {
            return Err(PortError::NotFound(format!("Badge {} not found", badge_id)));
        }
        Ok(())
    }
}
