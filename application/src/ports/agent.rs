//! Agent port
//!
//! Defines the worker capability the orchestrator dispatches requests to.
//! Concrete agents live in the infrastructure layer (or in tests).

use async_trait::async_trait;
use conclave_domain::{AgentIdentity, Request, Response};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Context shared between the orchestrator and context-aware agents
pub type SharedContext = Map<String, Value>;

/// Errors raised by a single agent invocation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Agent unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

/// Finite stream of responses from [`Agent::process_stream`].
///
/// Consumed by value; once drained it cannot be restarted.
pub struct ResponseStream {
    pub receiver: mpsc::Receiver<Response>,
}

impl ResponseStream {
    pub fn new(receiver: mpsc::Receiver<Response>) -> Self {
        Self { receiver }
    }

    /// Stream that yields exactly one response
    pub fn single(response: Response) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // Capacity is 1 and the receiver is alive, so this cannot fail
        let _ = tx.try_send(response);
        Self::new(rx)
    }

    pub async fn next(&mut self) -> Option<Response> {
        self.receiver.recv().await
    }

    /// Drain the stream into a vector
    pub async fn collect(mut self) -> Vec<Response> {
        let mut responses = Vec::new();
        while let Some(response) = self.receiver.recv().await {
            responses.push(response);
        }
        responses
    }
}

/// Capability for agents that accept pushed context.
///
/// The registry type-tests agents against this trait through
/// [`Agent::as_context_aware`]; agents without it are skipped.
pub trait ContextAware: Send + Sync {
    fn set_context(&self, context: &SharedContext);
}

/// A worker that turns a request into a response
#[async_trait]
pub trait Agent: Send + Sync {
    /// Display name, if the agent has one
    fn name(&self) -> Option<String>;

    /// Identity and advertised capabilities
    fn identity(&self) -> AgentIdentity;

    /// Answer `request` given the accumulated `context` string
    async fn process(&self, request: &Request, context: &str) -> Result<Response, AgentError>;

    /// Stream responses for `request`.
    ///
    /// Default implementation runs `process` with an empty context and yields
    /// its single result; a failure becomes one error response.
    async fn process_stream(&self, request: &Request) -> ResponseStream {
        let response = match self.process(request, "").await {
            Ok(response) => response,
            Err(e) => Response::agent_failure(e.to_string()),
        };
        ResponseStream::single(response)
    }

    /// Structural type name, used as a key when the agent has no name
    fn type_name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn as_context_aware(&self) -> Option<&dyn ContextAware> {
        None
    }
}

/// Name under which an agent's responses are keyed
pub fn display_name(agent: &dyn Agent) -> String {
    agent
        .name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| agent.type_name().to_string())
}

/// Deliver `context` to every context-aware agent in `targets`.
///
/// Returns how many agents received it.
pub fn broadcast_context(context: &SharedContext, targets: &[Arc<dyn Agent>]) -> usize {
    let mut delivered = 0;
    for aware in targets.iter().filter_map(|agent| agent.as_context_aware()) {
        aware.set_context(context);
        delivered += 1;
    }
    delivered
}

/// Render a shared context as `{key=value, ...}`; string values are unquoted
pub fn render_context(context: &SharedContext) -> String {
    let body = context
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}={}", key, s),
            other => format!("{}={}", key, other),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}
