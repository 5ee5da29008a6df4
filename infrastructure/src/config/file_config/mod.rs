//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to domain/application types
//! by their `to_*` methods.

mod agents;
mod engine;
mod generation;
mod output;
mod security;

pub use agents::{DEFAULT_AGENT_CONFIDENCE, FileAgentConfig, to_hierarchy, validate_agents};
pub use engine::FileEngineConfig;
pub use generation::{FileGenerationConfig, TextProvider};
pub use output::FileOutputConfig;
pub use security::FileSecurityConfig;

use conclave_application::EngineParams;
use conclave_domain::AgentHierarchy;
use conclave_domain::config::validation::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Engine loop and persistence settings
    pub engine: FileEngineConfig,
    /// Threat screening settings
    pub security: FileSecurityConfig,
    /// Text generation backend
    pub generation: FileGenerationConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Persona agent roster
    pub agents: Vec<FileAgentConfig>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Agent roster (empty/duplicate names, confidence and priority ranges)
    /// 2. `security.block_at` parses as a threat level
    /// 3. `generation.provider` is known and has what it needs
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = validate_agents(&self.agents);
        issues.extend(self.security.parse_block_at().1);
        issues.extend(self.generation.parse_provider().1);
        issues
    }

    /// Engine parameters from `[engine]` plus sampling from `[generation]`
    pub fn engine_params(&self) -> EngineParams {
        let mut params = self.engine.to_engine_params();
        params.temperature = self.generation.temperature;
        params.max_tokens = self.generation.max_tokens;
        params
    }

    pub fn hierarchy(&self) -> AgentHierarchy {
        to_hierarchy(&self.agents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::ThreatLevel;
    use conclave_domain::config::validation::ConfigIssueCode;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[engine]
context_sync_interval_secs = 10
history_file = "/tmp/conclave.jsonl"

[security]
blocked_patterns = ["exfiltrate"]
block_at = "medium"

[generation]
provider = "offline"
temperature = 0.2

[[agents]]
name = "muse"
capabilities = ["creative"]
priority = 1
persona = "You are a designer."

[[agents]]
name = "sentinel"
capabilities = ["security"]
confidence = 0.9
context_aware = true
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.context_sync_interval_secs, 10);
        assert_eq!(config.security.to_policy().block_at, ThreatLevel::Medium);
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[1].priority, 4);
        assert!(config.agents[1].context_aware);
        assert_eq!(config.engine_params().temperature, Some(0.2));
        assert_eq!(config.hierarchy().by_priority()[0].name, "muse");
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.agents.is_empty());
        assert!(config.security.enabled);
        assert!(config.output.color);
        assert!(config.engine.history_file.is_none());
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let toml_str = r#"
[security]
block_at = "apocalyptic"

[generation]
provider = "smoke-signals"

[[agents]]
name = ""
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let codes: Vec<_> = config.validate().iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                ConfigIssueCode::EmptyAgentName,
                ConfigIssueCode::UnknownThreatLevel,
                ConfigIssueCode::UnknownProvider,
            ]
        );
    }
}
