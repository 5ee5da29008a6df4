//! Agent hierarchy
//!
//! Static description of which agents exist, what they can do, and how they
//! rank. Master agents come from configuration; auxiliary agents can be added
//! at runtime and always rank last.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Priority assigned to auxiliary agents registered at runtime
pub const AUXILIARY_PRIORITY: u8 = 4;

/// Rank of an agent in the hierarchy, derived from its priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Master,
    Secondary,
    Tertiary,
    Auxiliary,
}

/// Configuration of one agent in the hierarchy (lower priority value ranks higher)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyAgentConfig {
    pub name: String,
    pub capabilities: BTreeSet<String>,
    pub priority: u8,
}

impl HierarchyAgentConfig {
    pub fn new<I, S>(name: impl Into<String>, capabilities: I, priority: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            priority,
        }
    }

    pub fn role(&self) -> AgentRole {
        match self.priority {
            0 | 1 => AgentRole::Master,
            2 => AgentRole::Secondary,
            3 => AgentRole::Tertiary,
            _ => AgentRole::Auxiliary,
        }
    }
}

/// Master and auxiliary agent configurations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentHierarchy {
    masters: Vec<HierarchyAgentConfig>,
    auxiliaries: Vec<HierarchyAgentConfig>,
}

impl AgentHierarchy {
    pub fn new(masters: Vec<HierarchyAgentConfig>) -> Self {
        Self {
            masters,
            auxiliaries: Vec::new(),
        }
    }

    /// Register an auxiliary agent at [`AUXILIARY_PRIORITY`] and return its config
    pub fn register_auxiliary<I, S>(
        &mut self,
        name: impl Into<String>,
        capabilities: I,
    ) -> HierarchyAgentConfig
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = HierarchyAgentConfig::new(name, capabilities, AUXILIARY_PRIORITY);
        self.auxiliaries.push(config.clone());
        config
    }

    /// Look up an agent by name; masters shadow auxiliaries with the same name
    pub fn config(&self, name: &str) -> Option<&HierarchyAgentConfig> {
        self.all().find(|config| config.name == name)
    }

    /// All configurations sorted by priority, ties kept in declaration order
    pub fn by_priority(&self) -> Vec<&HierarchyAgentConfig> {
        let mut configs: Vec<_> = self.all().collect();
        configs.sort_by_key(|config| config.priority);
        configs
    }

    pub fn len(&self) -> usize {
        self.masters.len() + self.auxiliaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn all(&self) -> impl Iterator<Item = &HierarchyAgentConfig> {
        self.masters.iter().chain(self.auxiliaries.iter())
    }
}
