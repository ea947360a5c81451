//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use progress_core::ports::{BadgeCatalog, Clock, LearnerStore};
use progress_core::ProgressService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub progress: Arc<ProgressService>,
    pub badges: Arc<dyn BadgeCatalog>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the engine over the given stores.
    pub fn new(
        config: Arc<Config>,
        learners: Arc<dyn LearnerStore>,
        badges: Arc<dyn BadgeCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let progress = Arc::new(ProgressService::new(learners, badges.clone(), clock));
        Self {
            progress,
            badges,
            config,
        }
    }
}
