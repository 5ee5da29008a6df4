//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod collaborate;
pub mod fusion;
pub mod insight;
pub mod orchestrator;
pub mod registry;
