pub mod domain;
pub mod leaderboard;
pub mod ports;
pub mod progress;
pub mod service;

pub use domain::{
    Badge, BadgeDraft, EarnedBadge, LeaderboardEntry, LearnerProgress, ProgressOutcome,
    RequirementType,
};
pub use ports::{BadgeCatalog, Clock, LearnerStore, PortError, PortResult, SystemClock};
pub use service::ProgressService;
