//! Consensus reduction
//!
//! Two reductions are available:
//!
//! - [`aggregate::aggregate`]: per agent, keep the best response seen across
//!   any number of collaboration rounds
//! - [`synthesis::synthesize`] + [`synthesis::confidence`]: collapse a
//!   transcript into one human-readable answer and one scalar confidence

pub mod aggregate;
pub mod synthesis;

pub use aggregate::{ResponseMap, aggregate, best_response};
pub use synthesis::{confidence, synthesize};
