//! Learning state: insight counting, evolution, and the orchestration history.

pub mod evolution;
pub mod history;
