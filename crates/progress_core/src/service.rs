//! crates/progress_core/src/service.rs
//!
//! The application service around the pure transition: load the record and the
//! badge catalog, apply `progress::apply_progress`, write the result back.
//!
//! Calls for the same learner are serialized through a keyed async mutex so that
//! concurrent awards can never overwrite each other. The store's version check
//! backs this up across processes.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{LeaderboardEntry, LearnerProgress, ProgressOutcome};
use crate::leaderboard;
use crate::ports::{BadgeCatalog, Clock, LearnerStore, PortError, PortResult};
use crate::progress;

pub struct ProgressService {
    learners: Arc<dyn LearnerStore>,
    badges: Arc<dyn BadgeCatalog>,
    clock: Arc<dyn Clock>,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ProgressService {
    pub fn new(
        learners: Arc<dyn LearnerStore>,
        badges: Arc<dyn BadgeCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            learners,
            badges,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Creates the zero-valued record for a newly created learner account.
    pub async fn register_learner(
        &self,
        learner_id: Uuid,
        display_name: &str,
    ) -> PortResult<LearnerProgress> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(PortError::InvalidArgument(
                "display_name is required".to_string(),
            ));
        }
        let record = self.learners.create_learner(learner_id, display_name).await?;
        info!(%learner_id, "Learner progress record created");
        Ok(record)
    }

    pub async fn progress(&self, learner_id: Uuid) -> PortResult<LearnerProgress> {
        self.learners.get_progress(learner_id).await
    }

    /// Awards `xp_earned` for an action performed today (UTC).
    pub async fn apply_progress(
        &self,
        learner_id: Uuid,
        xp_earned: i64,
    ) -> PortResult<ProgressOutcome> {
        let today = self.clock.today();
        self.apply_progress_on(learner_id, xp_earned, today).await
    }

    /// Awards `xp_earned` for an action performed on `today`.
    ///
    /// Either the whole update (XP, streak, badges) commits or nothing does.
    pub async fn apply_progress_on(
        &self,
        learner_id: Uuid,
        xp_earned: i64,
        today: NaiveDate,
    ) -> PortResult<ProgressOutcome> {
        if xp_earned < 0 {
            return Err(PortError::InvalidArgument(format!(
                "xp_earned must be >= 0, got {}",
                xp_earned
            )));
        }
        let current_day = self.clock.today();
        if today > current_day {
            return Err(PortError::InvalidArgument(format!(
                "study date {} is after the current day {}",
                today, current_day
            )));
        }

        let guard = self.lock_learner(learner_id).await;
        let result = self.transition(learner_id, xp_earned, today).await;
        drop(guard);
        self.release_learner(learner_id).await;

        let outcome = result?;
        info!(
            %learner_id,
            xp_earned,
            total_xp = outcome.progress.total_xp,
            current_streak = outcome.progress.current_streak,
            unlocked = outcome.newly_unlocked.len(),
            "Progress applied"
        );
        Ok(outcome)
    }

    /// The `n` learners with the most XP, ties broken by ascending learner id.
    pub async fn top_learners(&self, n: usize) -> PortResult<Vec<LeaderboardEntry>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let entries = self.learners.top_by_xp(n).await?;
        Ok(leaderboard::rank(entries, n))
    }

    async fn transition(
        &self,
        learner_id: Uuid,
        xp_earned: i64,
        today: NaiveDate,
    ) -> PortResult<ProgressOutcome> {
        let record = self.learners.get_progress(learner_id).await?;
        let catalog = self.badges.list_badges().await?;
        let now = self.clock.now();

        let outcome = progress::apply_progress(&record, xp_earned, today, &catalog, now)?;
        for badge in &outcome.newly_unlocked {
            debug!(%learner_id, badge_id = %badge.id, badge = %badge.name, "Badge unlocked");
        }

        let saved = self.learners.save_progress(&outcome.progress).await?;
        Ok(ProgressOutcome {
            progress: saved,
            newly_unlocked: outcome.newly_unlocked,
        })
    }

    async fn lock_learner(&self, learner_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(learner_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drops the learner's lock entry once nobody else holds or waits on it.
    async fn release_learner(&self, learner_id: Uuid) {
        let mut locks = self.locks.lock().await;
        if let Some(lock) = locks.get(&learner_id) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(&learner_id);
            }
        }
    }
}
