//! crates/progress_core/src/leaderboard.rs
//!
//! Read-only ranking of learners by cumulative XP.

use std::cmp::Ordering;

use crate::domain::LeaderboardEntry;

/// Leaderboard order: higher `total_xp` first, ties broken by ascending `learner_id`.
pub fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.total_xp
        .cmp(&a.total_xp)
        .then_with(|| a.learner_id.cmp(&b.learner_id))
}

/// Sorts `entries` into leaderboard order and keeps the first `n`.
pub fn rank(mut entries: Vec<LeaderboardEntry>, n: usize) -> Vec<LeaderboardEntry> {
    entries.sort_by(compare);
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(name: &str, total_xp: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            learner_id: Uuid::new_v4(),
            display_name: name.to_string(),
            total_xp,
        }
    }

    #[test]
    fn top_two_of_three() {
        let entries = vec![entry("a", 300), entry("b", 100), entry("c", 200)];
        let top = rank(entries, 2);
        let names: Vec<&str> = top.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn ties_break_on_learner_id() {
        let low = LeaderboardEntry {
            learner_id: Uuid::from_u128(1),
            display_name: "low".to_string(),
            total_xp: 50,
        };
        let high = LeaderboardEntry {
            learner_id: Uuid::from_u128(2),
            display_name: "high".to_string(),
            total_xp: 50,
        };
        let top = rank(vec![high.clone(), low.clone()], 10);
        assert_eq!(top, vec![low, high]);
    }

    #[test]
    fn n_larger_than_population_and_zero() {
        let entries = vec![entry("a", 1), entry("b", 2)];
        assert_eq!(rank(entries.clone(), 10).len(), 2);
        assert!(rank(entries, 0).is_empty());
    }
}
