//! crates/progress_core/src/domain.rs
//!
//! Defines the core data structures for the progress & achievement engine.
//! These structs are independent of any database; they derive `serde` traits only
//! so the HTTP layer can serialize them directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

use crate::ports::PortError;

//=========================================================================================
// Learner Progress
//=========================================================================================

/// The XP/streak/badge aggregate for one learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProgress {
    pub learner_id: Uuid,
    pub total_xp: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Day of the most recent qualifying action, in UTC. `None` before the first one.
    pub last_study_date: Option<NaiveDate>,
    pub earned_badges: Vec<EarnedBadge>,
    /// Optimistic concurrency token, bumped by the store on every write.
    #[serde(skip)]
    pub version: i64,
}

impl LearnerProgress {
    /// The zero-valued record created together with a learner account.
    pub fn new(learner_id: Uuid) -> Self {
        Self {
            learner_id,
            total_xp: 0,
            current_streak: 0,
            longest_streak: 0,
            last_study_date: None,
            earned_badges: Vec::new(),
            version: 0,
        }
    }

    pub fn has_badge(&self, badge_id: Uuid) -> bool {
        self.earned_badges.iter().any(|eb| eb.badge_id == badge_id)
    }

    /// Checks the record-level invariants that every persisted record must satisfy.
    pub fn validate(&self) -> Result<(), PortError> {
        if self.longest_streak < self.current_streak {
            return Err(PortError::InvalidArgument(format!(
                "longest_streak {} is below current_streak {}",
                self.longest_streak, self.current_streak
            )));
        }
        for (i, eb) in self.earned_badges.iter().enumerate() {
            if self.earned_badges[..i]
                .iter()
                .any(|other| other.badge_id == eb.badge_id)
            {
                return Err(PortError::InvalidArgument(format!(
                    "badge {} earned more than once",
                    eb.badge_id
                )));
            }
        }
        Ok(())
    }
}

/// A badge a learner has unlocked, with the wall-clock instant of the unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedBadge {
    pub badge_id: Uuid,
    pub unlocked_at: DateTime<Utc>,
}

//=========================================================================================
// Badge Catalog
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementType {
    XpReached,
    StreakReached,
    /// Reserved. No scoring signal reaches the engine, so it never unlocks.
    PerfectScore,
}

impl RequirementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementType::XpReached => "XP_REACHED",
            RequirementType::StreakReached => "STREAK_REACHED",
            RequirementType::PerfectScore => "PERFECT_SCORE",
        }
    }
}

impl fmt::Display for RequirementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementType {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "XP_REACHED" => Ok(RequirementType::XpReached),
            "STREAK_REACHED" => Ok(RequirementType::StreakReached),
            "PERFECT_SCORE" => Ok(RequirementType::PerfectScore),
            other => Err(PortError::InvalidArgument(format!(
                "unknown requirement type '{}'",
                other
            ))),
        }
    }
}

/// A badge definition from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub icon_url: String,
    pub requirement_type: RequirementType,
    pub requirement_value: u64,
}

/// The editable fields of a badge, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeDraft {
    pub name: String,
    pub icon_url: String,
    pub requirement_type: RequirementType,
    pub requirement_value: u64,
}

impl BadgeDraft {
    pub fn validate(&self) -> Result<(), PortError> {
        if self.name.trim().is_empty() {
            return Err(PortError::InvalidArgument("badge name is required".to_string()));
        }
        let invalid = |reason: String| {
            PortError::InvalidArgument(format!(
                "icon_url '{}' is not a valid http(s) URL: {}",
                self.icon_url, reason
            ))
        };
        let parsed = Url::parse(self.icon_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
        }
        match parsed.host_str() {
            Some(host) if !host.is_empty() => Ok(()),
            _ => Err(invalid("missing host".to_string())),
        }
    }

    pub fn into_badge(self, id: Uuid) -> Badge {
        Badge {
            id,
            name: self.name,
            icon_url: self.icon_url,
            requirement_type: self.requirement_type,
            requirement_value: self.requirement_value,
        }
    }
}

//=========================================================================================
// Results
//=========================================================================================

/// The result of one progress update: the new record plus the badges it unlocked,
/// in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressOutcome {
    pub progress: LearnerProgress,
    pub newly_unlocked: Vec<Badge>,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub learner_id: Uuid,
    pub display_name: String,
    pub total_xp: u64,
}
