//! Routing for simple requests

use crate::agent::identity::capability;
use crate::request::entities::Request;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rationale attached to every routing decision
pub const ROUTING_REASON: &str = "Optimal agent selection";

/// Which kind of agent should take a simple request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    Creative,
    Security,
    Generalist,
}

impl RouteTarget {
    /// Capability tag an agent must advertise to take this route
    pub fn capability(&self) -> &'static str {
        match self {
            RouteTarget::Creative => capability::CREATIVE,
            RouteTarget::Security => capability::SECURITY,
            RouteTarget::Generalist => capability::GENERALIST,
        }
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.capability())
    }
}

/// Outcome of routing: the target plus a fixed rationale for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    pub target: RouteTarget,
    pub reason: &'static str,
}

impl RouteDecision {
    /// Route on the request type: "creative" beats "security", anything else
    /// falls through to the generalist. Never fails.
    pub fn for_request(request: &Request) -> Self {
        let target = if request.request_type.contains("creative") {
            RouteTarget::Creative
        } else if request.request_type.contains("security") {
            RouteTarget::Security
        } else {
            RouteTarget::Generalist
        };
        Self {
            target,
            reason: ROUTING_REASON,
        }
    }
}
