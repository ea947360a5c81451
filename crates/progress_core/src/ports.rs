//! crates/progress_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the engine.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to stay independent of the concrete storage and of the wall clock.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{Badge, BadgeDraft, LeaderboardEntry, LearnerProgress};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by every port and by the engine itself.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The write did not commit. Nothing from the attempted update is visible.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    /// The stored record changed underneath the writer (version mismatch) or the
    /// item already exists. Nothing was written.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait LearnerStore: Send + Sync {
    /// Creates the zero-valued progress record for a new learner account.
    async fn create_learner(&self, learner_id: Uuid, display_name: &str)
        -> PortResult<LearnerProgress>;

    async fn get_progress(&self, learner_id: Uuid) -> PortResult<LearnerProgress>;

    /// Atomically writes the full record, including newly earned badges.
    ///
    /// The write only succeeds if the stored `version` still equals
    /// `progress.version`; otherwise `PortError::Conflict` is returned and nothing
    /// changes. Returns the record carrying its new version.
    async fn save_progress(&self, progress: &LearnerProgress) -> PortResult<LearnerProgress>;

    /// Up to `limit` learners ordered by `total_xp` descending, then `learner_id` ascending.
    async fn top_by_xp(&self, limit: usize) -> PortResult<Vec<LeaderboardEntry>>;
}

#[async_trait]
pub trait BadgeCatalog: Send + Sync {
    /// All badges in stable catalog order (insertion order).
    async fn list_badges(&self) -> PortResult<Vec<Badge>>;

    async fn get_badge(&self, badge_id: Uuid) -> PortResult<Badge>;

    async fn create_badge(&self, draft: BadgeDraft) -> PortResult<Badge>;

    async fn update_badge(&self, badge_id: Uuid, draft: BadgeDraft) -> PortResult<Badge>;

    async fn delete_badge(&self, badge_id: Uuid) -> PortResult<()>;
}

/// Source of wall-clock time. All calendar days are taken in UTC.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
