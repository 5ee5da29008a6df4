//! Application-level configuration.
//!
//! [`EngineParams`] groups the runtime knobs of the orchestrator that are not
//! domain policy: background loop cadence and generation sampling.

pub mod engine_params;

pub use engine_params::EngineParams;
