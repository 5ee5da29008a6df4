//! Application layer for conclave
//!
//! This crate contains the orchestrator, its use cases, the port definitions
//! adapters implement, and engine parameters. It depends only on the domain
//! layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::EngineParams;
pub use ports::{
    agent::{Agent, AgentError, ContextAware, ResponseStream, SharedContext},
    event_bus::{EventBus, NoEvents, OrchestrationEvent},
    progress::{CollaborationProgress, NoProgress},
    text_generation::{GenerationError, TextGenerationClient},
};
pub use use_cases::collaborate::{CollaborateInput, CollaborateUseCase};
pub use use_cases::fusion::{FusionController, FusionError, FusionOutput, FusionStrategy};
pub use use_cases::orchestrator::{Orchestrator, OrchestratorError};
pub use use_cases::registry::AgentRegistry;
