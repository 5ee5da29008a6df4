//! Orchestration rules.
//!
//! Everything here is a pure function of its inputs:
//!
//! ```text
//! Request ──classify──► ComplexityTier
//!    │                    │
//!    │        Simple ─────┼──► route()        ──► RouteDecision
//!    │        Moderate ───┼──► guided collaboration
//!    │        Complex ────┼──► FusionMode::select() ──► fusion pipeline
//!    │        Transcendent┘──► fusion + transcendent synthesis
//! ```
//!
//! The process-wide state enums ([`state::ConsciousnessState`],
//! [`state::FusionState`], [`state::LearningMode`]) are defined here but only
//! mutated by the application-layer orchestrator.

pub mod conversation;
pub mod fusion;
pub mod routing;
pub mod state;
pub mod status;
pub mod tier;
