//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `LearnerStore` and `BadgeCatalog` ports from the core crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use progress_core::domain::{
    Badge, BadgeDraft, EarnedBadge, LeaderboardEntry, LearnerProgress, RequirementType,
};
use progress_core::ports::{BadgeCatalog, LearnerStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the store ports.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn earned_badges(&self, learner_id: Uuid) -> PortResult<Vec<EarnedBadge>> {
        let records = sqlx::query_as::<_, EarnedBadgeRecord>(
            "SELECT badge_id, unlocked_at FROM learner_badges WHERE learner_id = $1 ORDER BY seq ASC",
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn persistence(e: sqlx::Error) -> PortError {
    PortError::PersistenceFailure(e.to_string())
}

fn to_column<T, U>(value: T, column: &str) -> PortResult<U>
where
    U: TryFrom<T>,
    T: Copy + std::fmt::Display,
{
    U::try_from(value).map_err(|_| {
        PortError::PersistenceFailure(format!("{} value {} does not fit its column", column, value))
    })
}

fn from_column<T, U>(value: T, column: &str) -> PortResult<U>
where
    U: TryFrom<T>,
    T: Copy + std::fmt::Display,
{
    U::try_from(value).map_err(|_| {
        PortError::Unexpected(format!("stored {} value {} is out of range", column, value))
    })
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct LearnerRecord {
    learner_id: Uuid,
    total_xp: i64,
    current_streak: i32,
    longest_streak: i32,
    last_study_date: Option<NaiveDate>,
    version: i64,
}
impl LearnerRecord {
    fn to_domain(self, earned_badges: Vec<EarnedBadge>) -> PortResult<LearnerProgress> {
        Ok(LearnerProgress {
            learner_id: self.learner_id,
            total_xp: from_column(self.total_xp, "total_xp")?,
            current_streak: from_column(self.current_streak, "current_streak")?,
            longest_streak: from_column(self.longest_streak, "longest_streak")?,
            last_study_date: self.last_study_date,
            earned_badges,
            version: self.version,
        })
    }
}

#[derive(FromRow)]
struct EarnedBadgeRecord {
    badge_id: Uuid,
    unlocked_at: DateTime<Utc>,
}
impl EarnedBadgeRecord {
    fn to_domain(self) -> EarnedBadge {
        EarnedBadge {
            badge_id: self.badge_id,
            unlocked_at: self.unlocked_at,
        }
    }
}

#[derive(FromRow)]
struct BadgeRecord {
    id: Uuid,
    name: String,
    icon_url: String,
    requirement_type: String,
    requirement_value: i64,
}
impl BadgeRecord {
    fn to_domain(self) -> PortResult<Badge> {
        let requirement_type = self
            .requirement_type
            .parse::<RequirementType>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Badge {
            id: self.id,
            name: self.name,
            icon_url: self.icon_url,
            requirement_type,
            requirement_value: from_column(self.requirement_value, "requirement_value")?,
        })
    }
}

#[derive(FromRow)]
struct StandingRecord {
    learner_id: Uuid,
    display_name: String,
    total_xp: i64,
}
impl StandingRecord {
    fn to_domain(self) -> PortResult<LeaderboardEntry> {
        Ok(LeaderboardEntry {
            learner_id: self.learner_id,
            display_name: self.display_name,
            total_xp: from_column(self.total_xp, "total_xp")?,
        })
    }
}

//=========================================================================================
// `LearnerStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl LearnerStore for PgStore {
    async fn create_learner(
        &self,
        learner_id: Uuid,
        display_name: &str,
    ) -> PortResult<LearnerProgress> {
        let record = sqlx::query_as::<_, LearnerRecord>(
            "INSERT INTO learners (learner_id, display_name) VALUES ($1, $2) \
             ON CONFLICT (learner_id) DO NOTHING \
             RETURNING learner_id, total_xp, current_streak, longest_streak, last_study_date, version",
        )
        .bind(learner_id)
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?
        .ok_or_else(|| PortError::Conflict(format!("Learner {} already exists", learner_id)))?;

        record.to_domain(Vec::new())
    }

    async fn get_progress(&self, learner_id: Uuid) -> PortResult<LearnerProgress> {
        let record = sqlx::query_as::<_, LearnerRecord>(
            "SELECT learner_id, total_xp, current_streak, longest_streak, last_study_date, version \
             FROM learners WHERE learner_id = $1",
        )
        .bind(learner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Learner {} not found", learner_id))
            }
            _ => unexpected(e),
        })?;

        let earned = self.earned_badges(learner_id).await?;
        record.to_domain(earned)
    }

    async fn save_progress(&self, progress: &LearnerProgress) -> PortResult<LearnerProgress> {
        progress.validate()?;
        let total_xp: i64 = to_column(progress.total_xp, "total_xp")?;
        let current_streak: i32 = to_column(progress.current_streak, "current_streak")?;
        let longest_streak: i32 = to_column(progress.longest_streak, "longest_streak")?;

        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let updated = sqlx::query(
            "UPDATE learners SET total_xp = $1, current_streak = $2, longest_streak = $3, \
             last_study_date = $4, version = version + 1 \
             WHERE learner_id = $5 AND version = $6",
        )
        .bind(total_xp)
        .bind(current_streak)
        .bind(longest_streak)
        .bind(progress.last_study_date)
        .bind(progress.learner_id)
        .bind(progress.version)
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(persistence)?;
            let exists = sqlx::query_scalar::<_, i64>("SELECT version FROM learners WHERE learner_id = $1")
                .bind(progress.learner_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;
            return Err(match exists {
                Some(stored) => {
                    warn!(
                        learner_id = %progress.learner_id,
                        expected = progress.version,
                        stored,
                        "Progress write lost a version race"
                    );
                    PortError::Conflict(format!(
                        "Learner {} was modified concurrently",
                        progress.learner_id
                    ))
                }
                None => PortError::NotFound(format!("Learner {} not found", progress.learner_id)),
            });
        }

        for earned in &progress.earned_badges {
            sqlx::query(
                "INSERT INTO learner_badges (learner_id, badge_id, unlocked_at) VALUES ($1, $2, $3) \
                 ON CONFLICT (learner_id, badge_id) DO NOTHING",
            )
            .bind(progress.learner_id)
            .bind(earned.badge_id)
            .bind(earned.unlocked_at)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
        }

        tx.commit().await.map_err(persistence)?;

        let mut saved = progress.clone();
        saved.version += 1;
        Ok(saved)
    }

    async fn top_by_xp(&self, limit: usize) -> PortResult<Vec<LeaderboardEntry>> {
        let limit: i64 = to_column(limit, "limit")?;
        let records = sqlx::query_as::<_, StandingRecord>(
            "SELECT learner_id, display_name, total_xp FROM learners \
             ORDER BY total_xp DESC, learner_id ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }
}

//=========================================================================================
// `BadgeCatalog` Trait Implementation
//=========================================================================================

#[async_trait]
impl BadgeCatalog for PgStore {
    async fn list_badges(&self) -> PortResult<Vec<Badge>> {
        let records = sqlx::query_as::<_, BadgeRecord>(
            "SELECT id, name, icon_url, requirement_type, requirement_value FROM badges ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_badge(&self, badge_id: Uuid) -> PortResult<Badge> {
        let record = sqlx::query_as::<_, BadgeRecord>(
            "SELECT id, name, icon_url, requirement_type, requirement_value FROM badges WHERE id = $1",
        )
        .bind(badge_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Badge {} not found", badge_id)),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn create_badge(&self, draft: BadgeDraft) -> PortResult<Badge> {
        draft.validate()?;
        let requirement_value: i64 = to_column(draft.requirement_value, "requirement_value")?;
        let record = sqlx::query_as::<_, BadgeRecord>(
            "INSERT INTO badges (id, name, icon_url, requirement_type, requirement_value) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, icon_url, requirement_type, requirement_value",
        )
        .bind(Uuid::new_v4())
        .bind(&draft.name)
        .bind(&draft.icon_url)
        .bind(draft.requirement_type.as_str())
        .bind(requirement_value)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;
        record.to_domain()
    }

    async fn update_badge(&self, badge_id: Uuid, draft: BadgeDraft) -> PortResult<Badge> {
        draft.validate()?;
        let requirement_value: i64 = to_column(draft.requirement_value, "requirement_value")?;
        let record = sqlx::query_as::<_, BadgeRecord>(
            "UPDATE badges SET name = $1, icon_url = $2, requirement_type = $3, requirement_value = $4 \
             WHERE id = $5 \
             RETURNING id, name, icon_url, requirement_type, requirement_value",
        )
        .bind(&draft.name)
        .bind(&draft.icon_url)
        .bind(draft.requirement_type.as_str())
        .bind(requirement_value)
        .bind(badge_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?
        .ok_or_else(|| PortError::NotFound(format!("Badge {} not found", badge_id)))?;
        record.to_domain()
    }

    async fn delete_badge(&self, badge_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM badges WHERE id = $1")
            .bind(badge_id)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Badge {} not found", badge_id)));
        }
        Ok(())
    }
}
