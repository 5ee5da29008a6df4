//! Request entity

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered key/value context attached to a request
pub type RequestContext = BTreeMap<String, String>;

/// A unit of work submitted to the orchestrator.
///
/// Requests are immutable once built; the builder methods consume `self`.
///
/// # Example
///
/// ```
/// use conclave_domain::Request;
///
/// let request = Request::new("Design a login screen", "creative_design")
///     .with_context("platform", "android")
///     .with_metadata("origin", "cli");
///
/// assert_eq!(request.context_len(), 1);
/// assert!(request.has_context_key("platform"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The query text
    pub query: String,
    /// Free-form request type (e.g. "creative_design", "security_analysis")
    #[serde(rename = "type")]
    pub request_type: String,
    /// Optional ordered context map
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<RequestContext>,
    /// Caller metadata, never interpreted by the engine
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Request {
    pub fn new(query: impl Into<String>, request_type: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            request_type: request_type.into(),
            context: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Add a single context entry
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the whole context map
    pub fn with_context_map(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Number of context entries; an absent context counts as zero
    pub fn context_len(&self) -> usize {
        self.context.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn has_context_key(&self, key: &str) -> bool {
        self.context
            .as_ref()
            .is_some_and(|context| context.contains_key(key))
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|context| context.get(key))
            .map(String::as_str)
    }

    /// Render the context as `{k=v, k=v}` for agents that take a context string
    pub fn context_string(&self) -> String {
        match &self.context {
            Some(context) => render_map(context),
            None => "{}".to_string(),
        }
    }

    /// Check the request is well-formed enough to dispatch
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.request_type.trim().is_empty() {
            return Err(DomainError::InvalidRequest(
                "request type must not be empty".to_string(),
            ));
        }
        if let Some(context) = &self.context
            && context.keys().any(|key| key.trim().is_empty())
        {
            return Err(DomainError::InvalidRequest(
                "context keys must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.request_type, self.query)
    }
}

/// Render an ordered map as `{k=v, k=v}`
pub fn render_map<V: fmt::Display>(map: &BTreeMap<String, V>) -> String {
    let body = map
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}
