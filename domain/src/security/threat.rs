//! Threat assessment
//!
//! A request is scanned for blocked patterns; the number of distinct matches
//! determines a [`ThreatLevel`]. [`SecurityPolicy`] rejects requests at or
//! above its blocking level.

use crate::core::error::DomainError;
use crate::core::time::clamp_confidence;
use crate::request::entities::Request;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity derived from the number of matched indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    /// 0-1 indicators is low, 2-3 medium, 4-5 high, more is critical
    pub fn from_indicator_count(count: usize) -> Self {
        match count {
            0 | 1 => ThreatLevel::Low,
            2 | 3 => ThreatLevel::Medium,
            4 | 5 => ThreatLevel::High,
            _ => ThreatLevel::Critical,
        }
    }

    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            ThreatLevel::Low => &[
                "No action required",
                "Continue normal operations",
                "Standard monitoring",
                "Log analysis",
            ],
            ThreatLevel::Medium => &["Enhanced monitoring", "Access review", "Security scan"],
            ThreatLevel::High => &[
                "Immediate isolation",
                "Forensic analysis",
                "Incident response",
            ],
            ThreatLevel::Critical => &[
                "Emergency shutdown",
                "Full system isolation",
                "Emergency response",
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ThreatLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ThreatLevel::Low),
            "medium" => Ok(ThreatLevel::Medium),
            "high" => Ok(ThreatLevel::High),
            "critical" => Ok(ThreatLevel::Critical),
            other => Err(format!("unknown threat level: {}", other)),
        }
    }
}

/// Result of scanning one piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub level: ThreatLevel,
    pub indicators: Vec<String>,
    pub confidence: f32,
}

impl ThreatAssessment {
    pub fn is_clean(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn recommendations(&self) -> &'static [&'static str] {
        self.level.recommendations()
    }
}

/// Scan `text` for each pattern, case-insensitively.
///
/// Confidence starts at 0.6 and grows by 0.1 per indicator, capped at 0.95.
///
/// ```
/// use conclave_domain::security::{threat::assess, ThreatLevel};
///
/// let patterns = vec!["rm -rf".to_string(), "drop table".to_string()];
/// let assessment = assess("please DROP TABLE users; rm -rf /", &patterns);
/// assert_eq!(assessment.level, ThreatLevel::Medium);
/// assert_eq!(assessment.indicators.len(), 2);
/// ```
pub fn assess(text: &str, patterns: &[String]) -> ThreatAssessment {
    let haystack = text.to_lowercase();
    let mut indicators: Vec<String> = Vec::new();
    for pattern in patterns {
        let needle = pattern.trim().to_lowercase();
        if needle.is_empty() || indicators.contains(&needle) {
            continue;
        }
        if haystack.contains(&needle) {
            indicators.push(needle);
        }
    }

    let confidence = clamp_confidence((0.6 + 0.1 * indicators.len() as f32).min(0.95));
    ThreatAssessment {
        level: ThreatLevel::from_indicator_count(indicators.len()),
        indicators,
        confidence,
    }
}

/// Screening rules applied before a request is processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    pub enabled: bool,
    pub blocked_patterns: Vec<String>,
    pub block_at: ThreatLevel,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            blocked_patterns: Vec::new(),
            block_at: ThreatLevel::High,
        }
    }
}

impl SecurityPolicy {
    /// Policy that accepts everything
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.blocked_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_block_at(mut self, level: ThreatLevel) -> Self {
        self.block_at = level;
        self
    }

    /// Assess the request's type, query and context values.
    ///
    /// A request with no matched indicator always passes, so `block_at = low`
    /// rejects any match rather than every request.
    pub fn evaluate(&self, request: &Request) -> Result<ThreatAssessment, DomainError> {
        if !self.enabled || self.blocked_patterns.is_empty() {
            return Ok(assess("", &[]));
        }

        let mut text = format!("{}\n{}", request.request_type, request.query);
        if let Some(context) = &request.context {
            for value in context.values() {
                text.push('\n');
                text.push_str(value);
            }
        }

        let assessment = assess(&text, &self.blocked_patterns);
        if !assessment.is_clean() && assessment.level >= self.block_at {
            return Err(DomainError::PolicyRejected(format!(
                "{} threat level ({})",
                assessment.level,
                assessment.indicators.join(", ")
            )));
        }
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(ThreatLevel::from_indicator_count(0), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_indicator_count(1), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_indicator_count(2), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_indicator_count(3), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_indicator_count(4), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_indicator_count(5), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_indicator_count(6), ThreatLevel::Critical);
    }

    #[test]
    fn test_each_level_has_recommendations() {
        for level in [
            ThreatLevel::Low,
            ThreatLevel::Medium,
            ThreatLevel::High,
            ThreatLevel::Critical,
        ] {
            assert!(!level.recommendations().is_empty());
        }
        assert_eq!(ThreatLevel::Low.recommendations()[0], "No action required");
    }

    #[test]
    fn test_assess_confidence_is_capped() {
        let list = patterns(&["a", "b", "c", "d", "e", "f"]);
        let assessment = assess("a b c d e f", &list);
        assert_eq!(assessment.level, ThreatLevel::Critical);
        assert!((assessment.confidence - 0.95).abs() < 1e-6);

        let clean = assess("nothing here", &list[..0]);
        assert!(clean.is_clean());
        assert!((clean.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_assess_ignores_duplicates_and_blanks() {
        let assessment = assess("exploit", &patterns(&["EXPLOIT", "exploit", "  "]));
        assert_eq!(assessment.indicators, vec!["exploit".to_string()]);
    }

    #[test]
    fn test_policy_rejects_at_block_level() {
        let policy = SecurityPolicy::default()
            .with_patterns(["exploit", "payload", "rootkit", "keylogger"])
            .with_block_at(ThreatLevel::High);
        let request = Request::new("deploy exploit payload with rootkit and keylogger", "ops");

        let err = policy.evaluate(&request).unwrap_err();
        assert!(matches!(err, DomainError::PolicyRejected(_)));
        assert!(err.to_string().starts_with("Security policy violation: "));
    }

    #[test]
    fn test_policy_allows_below_block_level() {
        let policy = SecurityPolicy::default()
            .with_patterns(["exploit", "payload"])
            .with_block_at(ThreatLevel::High);
        let assessment = policy
            .evaluate(&Request::new("exploit payload", "ops"))
            .unwrap();
        assert_eq!(assessment.level, ThreatLevel::Medium);
    }

    #[test]
    fn test_policy_scans_context_values() {
        let policy = SecurityPolicy::default()
            .with_patterns(["exploit"])
            .with_block_at(ThreatLevel::Low);
        let request = Request::new("hello", "chat").with_context("note", "Exploit here");
        assert!(policy.evaluate(&request).is_err());
    }

    #[test]
    fn test_low_block_level_still_passes_clean_requests() {
        let policy = SecurityPolicy::default()
            .with_patterns(["exploit"])
            .with_block_at(ThreatLevel::Low);
        assert!(policy.evaluate(&Request::new("hello", "chat")).is_ok());
    }

    #[test]
    fn test_disabled_policy_accepts_everything() {
        let policy = SecurityPolicy::disabled().with_patterns(["exploit"]);
        assert!(policy.evaluate(&Request::new("exploit", "ops")).is_ok());
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("HIGH".parse::<ThreatLevel>(), Ok(ThreatLevel::High));
        assert!("severe".parse::<ThreatLevel>().is_err());
    }
}
