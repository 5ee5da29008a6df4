//! Insight counter and evolution level

use crate::orchestration::state::LearningMode;
use serde::{Deserialize, Serialize};

/// Every this many insights the tracker evolves
pub const EVOLUTION_INTERVAL: u64 = 100;

/// Evolution level gained per evolution
pub const EVOLUTION_INCREMENT: f64 = 0.1;

/// Evolution level of a fresh tracker
pub const BASELINE_EVOLUTION_LEVEL: f64 = 1.0;

/// Emitted when the insight counter crosses an evolution threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvolutionEvent {
    pub insight_count: u64,
    pub evolution_level: f64,
    pub learning_mode: LearningMode,
}

/// Monotonic insight counter driving evolution.
///
/// The threshold check runs on the post-increment value, so the 100th,
/// 200th, ... insight evolves. The level never decreases and the learning
/// mode never drops below `Active` once awakened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionTracker {
    insight_count: u64,
    evolution_level: f64,
    learning_mode: LearningMode,
}

impl Default for EvolutionTracker {
    fn default() -> Self {
        Self {
            insight_count: 0,
            evolution_level: BASELINE_EVOLUTION_LEVEL,
            learning_mode: LearningMode::Passive,
        }
    }
}

impl EvolutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insight_count(&self) -> u64 {
        self.insight_count
    }

    pub fn evolution_level(&self) -> f64 {
        self.evolution_level
    }

    pub fn learning_mode(&self) -> LearningMode {
        self.learning_mode
    }

    /// Raise the learning mode to at least `Active`
    pub fn awaken(&mut self) {
        self.learning_mode = self.learning_mode.max(LearningMode::Active);
    }

    /// Count one insight; returns the evolution it triggered, if any
    pub fn record_insight(&mut self) -> Option<EvolutionEvent> {
        self.insight_count += 1;
        if self.insight_count % EVOLUTION_INTERVAL == 0 {
            Some(self.evolve())
        } else {
            None
        }
    }

    /// Raise the level by [`EVOLUTION_INCREMENT`] and accelerate learning
    pub fn evolve(&mut self) -> EvolutionEvent {
        self.evolution_level += EVOLUTION_INCREMENT;
        self.learning_mode = self.learning_mode.max(LearningMode::Accelerated);
        EvolutionEvent {
            insight_count: self.insight_count,
            evolution_level: self.evolution_level,
            learning_mode: self.learning_mode,
        }
    }
}
