//! Complexity classification

use crate::request::entities::Request;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Context size above which a request is handled at the highest tier
pub const TRANSCENDENT_CONTEXT_THRESHOLD: usize = 10;

/// Context key that explicitly asks for fusion processing
pub const FUSION_REQUIRED_KEY: &str = "fusion_required";

/// Substring of the request type that marks analysis work
pub const ANALYSIS_MARKER: &str = "analysis";

/// Complexity bucket assigned to every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityTier {
    Simple,
    Moderate,
    Complex,
    Transcendent,
}

impl ComplexityTier {
    /// Classify a request. Total and deterministic; rules are checked in order:
    ///
    /// 1. more than [`TRANSCENDENT_CONTEXT_THRESHOLD`] context entries → `Transcendent`
    /// 2. context contains [`FUSION_REQUIRED_KEY`] → `Complex`
    /// 3. type contains [`ANALYSIS_MARKER`] → `Moderate`
    /// 4. otherwise `Simple`
    ///
    /// # Example
    ///
    /// ```
    /// use conclave_domain::{ComplexityTier, Request};
    ///
    /// let request = Request::new("audit the login flow", "security_analysis");
    /// assert_eq!(ComplexityTier::classify(&request), ComplexityTier::Moderate);
    /// ```
    pub fn classify(request: &Request) -> Self {
        if request.context_len() > TRANSCENDENT_CONTEXT_THRESHOLD {
            ComplexityTier::Transcendent
        } else if request.has_context_key(FUSION_REQUIRED_KEY) {
            ComplexityTier::Complex
        } else if request.request_type.contains(ANALYSIS_MARKER) {
            ComplexityTier::Moderate
        } else {
            ComplexityTier::Simple
        }
    }

    /// Whether this tier is handled by the fusion controller
    pub fn requires_fusion(&self) -> bool {
        matches!(self, ComplexityTier::Complex | ComplexityTier::Transcendent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityTier::Simple => "simple",
            ComplexityTier::Moderate => "moderate",
            ComplexityTier::Complex => "complex",
            ComplexityTier::Transcendent => "transcendent",
        }
    }
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
