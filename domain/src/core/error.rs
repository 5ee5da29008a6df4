//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Engine not initialized")]
    NotInitialized,

    #[error("Security policy violation: {0}")]
    PolicyRejected(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    /// Errors that are reported as data (an error response) rather than propagated
    pub fn is_request_scoped(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidRequest(_) | DomainError::PolicyRejected(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_message_prefixes() {
        let invalid = DomainError::InvalidRequest("type is empty".into());
        assert!(invalid.to_string().starts_with("Invalid request: "));

        let rejected = DomainError::PolicyRejected("level high".into());
        assert!(rejected.to_string().starts_with("Security policy violation: "));
    }

    #[test]
    fn test_request_scoped() {
        assert!(DomainError::InvalidRequest("x".into()).is_request_scoped());
        assert!(DomainError::PolicyRejected("x".into()).is_request_scoped());
        assert!(!DomainError::NotInitialized.is_request_scoped());
        assert!(!DomainError::Cancelled.is_request_scoped());
    }
}
