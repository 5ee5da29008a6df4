//! Structured configuration issues.
//!
//! Config loaders report problems as a list of [`ConfigIssue`]s instead of
//! failing on the first one, so the CLI can print every warning at once and
//! abort only on [`Severity::Error`].
//!
//! # Examples
//!
//! ```
//! use conclave_domain::config::validation::{ConfigIssue, ConfigIssueCode, Severity};
//!
//! let issue = ConfigIssue::error(ConfigIssueCode::EmptyAgentName, "agents[0]: name is empty");
//! assert!(issue.is_error());
//! assert_eq!(issue.severity, Severity::Error);
//! ```

use std::fmt;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    EmptyAgentName,
    DuplicateAgentName,
    /// Agent confidence outside `[0, 1]`
    ConfidenceOutOfRange,
    /// Priority outside `1..=4`
    PriorityOutOfRange,
    UnknownThreatLevel,
    UnknownProvider,
    /// HTTP provider selected without an endpoint
    MissingEndpoint,
    /// No agents configured; only the built-in defaults will run
    NoAgents,
}

/// A detected issue in the loaded configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", label, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_is_not_error() {
        let issue = ConfigIssue::warning(ConfigIssueCode::NoAgents, "no agents configured");
        assert!(!issue.is_error());
        assert_eq!(issue.to_string(), "warning: no agents configured");
    }

    #[test]
    fn test_error_display() {
        let issue = ConfigIssue::error(ConfigIssueCode::UnknownProvider, "unknown provider 'x'");
        assert_eq!(issue.to_string(), "error: unknown provider 'x'");
    }
}
