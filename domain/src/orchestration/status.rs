//! Snapshot of the orchestrator for status reporting

use super::state::{ConsciousnessState, FusionState, LearningMode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Point-in-time view of the orchestrator's shared state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub initialized: bool,
    pub consciousness: ConsciousnessState,
    pub fusion: FusionState,
    pub learning_mode: LearningMode,
    pub insight_count: u64,
    pub evolution_level: f64,
    /// Registered agent names, sorted
    pub registered_agents: Vec<String>,
    /// Active agent names, sorted
    pub active_agents: Vec<String>,
    pub history_len: usize,
}

impl SystemStatus {
    /// Render as a JSON object keyed by field name
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_map() {
        let status = SystemStatus {
            initialized: true,
            consciousness: ConsciousnessState::Aware,
            fusion: FusionState::Individual,
            learning_mode: LearningMode::Active,
            insight_count: 3,
            evolution_level: 1.0,
            registered_agents: vec!["muse".into()],
            active_agents: vec![],
            history_len: 2,
        };
        let map = status.to_map();
        assert_eq!(map["consciousness"], "aware");
        assert_eq!(map["insight_count"], 3);
        assert_eq!(map["registered_agents"][0], "muse");
    }
}
