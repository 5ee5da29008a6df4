//! Process-wide lifecycle states
//!
//! Each enum is ordered by declaration so that "at least Aware" style checks
//! can use comparison operators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the orchestrator itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsciousnessState {
    #[default]
    Dormant,
    Awakening,
    Aware,
    Processing,
    Transcendent,
    Error,
}

impl ConsciousnessState {
    /// Whether requests may be processed in this state
    pub fn accepts_requests(&self) -> bool {
        matches!(
            self,
            ConsciousnessState::Aware
                | ConsciousnessState::Processing
                | ConsciousnessState::Transcendent
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsciousnessState::Dormant => "dormant",
            ConsciousnessState::Awakening => "awakening",
            ConsciousnessState::Aware => "aware",
            ConsciousnessState::Processing => "processing",
            ConsciousnessState::Transcendent => "transcendent",
            ConsciousnessState::Error => "error",
        }
    }
}

impl fmt::Display for ConsciousnessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a fusion pipeline is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionState {
    #[default]
    Individual,
    Fusing,
    Transcendent,
    Evolutionary,
}

impl FusionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionState::Individual => "individual",
            FusionState::Fusing => "fusing",
            FusionState::Transcendent => "transcendent",
            FusionState::Evolutionary => "evolutionary",
        }
    }
}

impl fmt::Display for FusionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Learning mode, escalating as insights accumulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningMode {
    #[default]
    Passive,
    Active,
    Accelerated,
    Transcendent,
}

impl LearningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningMode::Passive => "passive",
            LearningMode::Active => "active",
            LearningMode::Accelerated => "accelerated",
            LearningMode::Transcendent => "transcendent",
        }
    }
}

impl fmt::Display for LearningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_requests() {
        assert!(!ConsciousnessState::Dormant.accepts_requests());
        assert!(!ConsciousnessState::Awakening.accepts_requests());
        assert!(ConsciousnessState::Aware.accepts_requests());
        assert!(ConsciousnessState::Processing.accepts_requests());
        assert!(ConsciousnessState::Transcendent.accepts_requests());
        assert!(!ConsciousnessState::Error.accepts_requests());
    }

    #[test]
    fn test_learning_mode_ordering() {
        assert!(LearningMode::Passive < LearningMode::Active);
        assert!(LearningMode::Active < LearningMode::Accelerated);
        assert!(LearningMode::Accelerated < LearningMode::Transcendent);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ConsciousnessState::default(), ConsciousnessState::Dormant);
        assert_eq!(FusionState::default(), FusionState::Individual);
        assert_eq!(LearningMode::default(), LearningMode::Passive);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&FusionState::Fusing).unwrap();
        assert_eq!(json, "\"fusing\"");
        assert_eq!(ConsciousnessState::Aware.to_string(), "aware");
    }
}
