//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use coaching_core::{
    ports::{AssessmentAnalysisService, CoachingService, EntityStore},
    CoachingOrchestrator, ScoringOrchestrator,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub config: Arc<Config>,
    pub coaching: CoachingOrchestrator,
    pub scoring: ScoringOrchestrator,
}

impl AppState {
    /// Wires the orchestrators to the store and the two AI adapters.
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn EntityStore>,
        coach: Arc<dyn CoachingService>,
        analyst: Arc<dyn AssessmentAnalysisService>,
    ) -> Self {
        let coaching = CoachingOrchestrator::new(store.clone(), coach, config.ai_timeout);
        let scoring = ScoringOrchestrator::new(store.clone(), analyst, config.ai_timeout);
        Self {
            store,
            config,
            coaching,
            scoring,
        }
    }
}
