//! Agent roster from TOML (`[[agents]]` array)

use conclave_domain::config::validation::{ConfigIssue, ConfigIssueCode};
use conclave_domain::{AUXILIARY_PRIORITY, AgentHierarchy, HierarchyAgentConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Confidence a persona agent reports when none is configured
pub const DEFAULT_AGENT_CONFIDENCE: f32 = 0.7;

/// One persona agent
///
/// # Example
///
/// ```toml
/// [[agents]]
/// name = "muse"
/// capabilities = ["creative"]
/// priority = 1
/// persona = "You are a playful designer."
/// confidence = 0.8
/// context_aware = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub name: String,
    /// Capability tags ("creative", "security", "generalist", ...)
    pub capabilities: Vec<String>,
    /// 1 = master ... 4 = auxiliary
    pub priority: u8,
    /// System prompt prepended to every request
    pub persona: String,
    pub confidence: f32,
    /// Receive shared context pushes from the orchestrator
    pub context_aware: bool,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            capabilities: Vec::new(),
            priority: AUXILIARY_PRIORITY,
            persona: String::new(),
            confidence: DEFAULT_AGENT_CONFIDENCE,
            context_aware: false,
        }
    }
}

impl FileAgentConfig {
    pub fn to_hierarchy_config(&self) -> HierarchyAgentConfig {
        HierarchyAgentConfig::new(
            self.name.trim(),
            self.capabilities.iter().cloned(),
            self.priority.clamp(1, AUXILIARY_PRIORITY),
        )
    }
}

/// Build the hierarchy from the roster; entries with empty names are skipped
pub fn to_hierarchy(agents: &[FileAgentConfig]) -> AgentHierarchy {
    AgentHierarchy::new(
        agents
            .iter()
            .filter(|agent| !agent.name.trim().is_empty())
            .map(FileAgentConfig::to_hierarchy_config)
            .collect(),
    )
}

/// Validate the roster as a whole
pub fn validate_agents(agents: &[FileAgentConfig]) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    if agents.is_empty() {
        issues.push(ConfigIssue::warning(
            ConfigIssueCode::NoAgents,
            "agents: none configured, using the built-in roster",
        ));
    }

    for (index, agent) in agents.iter().enumerate() {
        let name = agent.name.trim();
        if name.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyAgentName,
                format!("agents[{}]: name is empty", index),
            ));
            continue;
        }
        if !seen.insert(name.to_string()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::DuplicateAgentName,
                format!("agents[{}]: duplicate name '{}'", index, name),
            ));
        }
        if !(0.0..=1.0).contains(&agent.confidence) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ConfidenceOutOfRange,
                format!(
                    "agents.{}.confidence: {} is outside [0, 1] and will be clamped",
                    name, agent.confidence
                ),
            ));
        }
        if !(1..=AUXILIARY_PRIORITY).contains(&agent.priority) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::PriorityOutOfRange,
                format!(
                    "agents.{}.priority: {} is outside 1..={} and will be clamped",
                    name, agent.priority, AUXILIARY_PRIORITY
                ),
            ));
        }
    }

    issues
}
