//! crates/progress_core/src/progress.rs
//!
//! The pure progress transition: XP accrual, day-based streaks, and badge unlocks.
//! Nothing in here touches storage or reads the clock; the caller supplies
//! `today` and `now`, which keeps every rule unit-testable.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::domain::{Badge, EarnedBadge, LearnerProgress, ProgressOutcome, RequirementType};
use crate::ports::{PortError, PortResult};

/// How `today` relates to the learner's last study day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// No study day recorded yet.
    First,
    SameDay,
    NextDay,
    /// At least one whole day was skipped.
    Gap,
    /// `today` precedes the stored day (clock skew or a replayed event).
    Backwards,
}

impl StreakTransition {
    pub fn classify(last_study_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(last) = last_study_date else {
            return StreakTransition::First;
        };
        match today.signed_duration_since(last).num_days() {
            0 => StreakTransition::SameDay,
            1 => StreakTransition::NextDay,
            d if d > 1 => StreakTransition::Gap,
            _ => StreakTransition::Backwards,
        }
    }

    /// The streak length after this transition, given the current one.
    pub fn next_streak(self, current: u32) -> u32 {
        match self {
            StreakTransition::First | StreakTransition::Gap => 1,
            StreakTransition::NextDay => current.saturating_add(1),
            StreakTransition::SameDay | StreakTransition::Backwards => current,
        }
    }
}

/// Whether `badge`'s rule holds for the given (already updated) progress.
pub fn rule_satisfied(badge: &Badge, progress: &LearnerProgress) -> bool {
    match badge.requirement_type {
        RequirementType::XpReached => progress.total_xp >= badge.requirement_value,
        RequirementType::StreakReached => {
            u64::from(progress.current_streak) >= badge.requirement_value
        }
        RequirementType::PerfectScore => false,
    }
}

/// Applies one XP award to `record`.
///
/// Returns the updated record and the badges unlocked by this call, in `catalog`
/// order. `record` itself is never modified, so a rejected call leaves the
/// caller's copy untouched.
pub fn apply_progress(
    record: &LearnerProgress,
    xp_earned: i64,
    today: NaiveDate,
    catalog: &[Badge],
    now: DateTime<Utc>,
) -> PortResult<ProgressOutcome> {
    let xp = u64::try_from(xp_earned).map_err(|_| {
        PortError::InvalidArgument(format!("xp_earned must be >= 0, got {}", xp_earned))
    })?;

    let mut next = record.clone();

    // 1. XP
    next.total_xp = record.total_xp.checked_add(xp).ok_or_else(|| {
        PortError::InvalidArgument(format!(
            "xp_earned {} overflows total_xp {}",
            xp, record.total_xp
        ))
    })?;

    // 2. Streak
    let transition = StreakTransition::classify(record.last_study_date, today);
    if transition == StreakTransition::Backwards {
        warn!(
            learner_id = %record.learner_id,
            %today,
            last_study_date = ?record.last_study_date,
            "Progress date precedes last study date; streak left unchanged"
        );
    }
    next.current_streak = transition.next_streak(record.current_streak);

    // 3. Longest streak
    next.longest_streak = record.longest_streak.max(next.current_streak);

    // 4. Last study date only moves forward
    if matches!(
        transition,
        StreakTransition::First | StreakTransition::NextDay | StreakTransition::Gap
    ) {
        next.last_study_date = Some(today);
    }

    // 5. Badges, evaluated against the post-update state
    let mut newly_unlocked = Vec::new();
    for badge in catalog {
        if next.has_badge(badge.id) || !rule_satisfied(badge, &next) {
            continue;
        }
        next.earned_badges.push(EarnedBadge {
            badge_id: badge.id,
            unlocked_at: now,
        });
        newly_unlocked.push(badge.clone());
    }

    Ok(ProgressOutcome {
        progress: next,
        newly_unlocked,
    })
}
