//! Agent identity value object

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Well-known capability tags
pub mod capability {
    /// Agents that handle creative and design work
    pub const CREATIVE: &str = "creative";
    /// Agents that handle security and threat analysis
    pub const SECURITY: &str = "security";
    /// The generalist that receives everything else
    pub const GENERALIST: &str = "generalist";
}

/// Name the orchestrator uses for its own messages and fallbacks
pub const ORCHESTRATOR_NAME: &str = "orchestrator";

/// Stable identity of a registered agent: a unique name plus advertised capabilities
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub name: String,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

impl AgentIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: BTreeSet::new(),
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    /// Identity of the orchestrator itself, used when no agent can take a route
    pub fn orchestrator() -> Self {
        Self::new(ORCHESTRATOR_NAME).with_capability(capability::GENERALIST)
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let identity = AgentIdentity::new("muse").with_capabilities(["creative", "design"]);
        assert!(identity.has_capability(capability::CREATIVE));
        assert!(!identity.has_capability(capability::SECURITY));
        assert_eq!(identity.to_string(), "muse");
    }

    #[test]
    fn test_orchestrator_identity() {
        let identity = AgentIdentity::orchestrator();
        assert_eq!(identity.name, ORCHESTRATOR_NAME);
        assert!(identity.has_capability(capability::GENERALIST));
    }
}
