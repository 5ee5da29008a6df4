//! Request screening against configured threat indicators.

pub mod threat;

pub use threat::{SecurityPolicy, ThreatAssessment, ThreatLevel};
