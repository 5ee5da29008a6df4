//! Domain layer for conclave
//!
//! This crate contains the core rules, entities, and value objects of the
//! multi-agent orchestration engine. It has no dependencies on async
//! runtimes, infrastructure, or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tiers
//!
//! Every [`Request`] is classified into a [`ComplexityTier`]:
//!
//! - **Simple**: routed to exactly one agent
//! - **Moderate**: guided collaboration across the active agents
//! - **Complex / Transcendent**: a fusion pipeline selected by [`FusionMode`]
//!
//! ## Consensus
//!
//! Parallel or repeated answers are reduced by [`consensus::aggregate`]
//! (best confidence per agent) and [`consensus::synthesize`] (one summary
//! line across agents).

pub mod agent;
pub mod config;
pub mod consensus;
pub mod core;
pub mod learning;
pub mod orchestration;
pub mod request;
pub mod security;

// Re-export commonly used types
pub use agent::{
    hierarchy::{AUXILIARY_PRIORITY, AgentHierarchy, AgentRole, HierarchyAgentConfig},
    identity::{AgentIdentity, ORCHESTRATOR_NAME, capability},
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use consensus::ResponseMap;
pub use core::{
    error::DomainError,
    time::{clamp_confidence, current_timestamp},
};
pub use learning::{
    evolution::{EvolutionEvent, EvolutionTracker},
    history::{HistoryEntry, HistoryLog},
};
pub use orchestration::{
    conversation::ConversationMode,
    fusion::FusionMode,
    routing::{RouteDecision, RouteTarget},
    state::{ConsciousnessState, FusionState, LearningMode},
    status::SystemStatus,
    tier::ComplexityTier,
};
pub use request::{
    entities::{Request, RequestContext},
    message::AgentMessage,
    response::Response,
};
pub use security::{SecurityPolicy, ThreatAssessment, ThreatLevel};
