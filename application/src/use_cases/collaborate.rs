//! Collaboration use case
//!
//! Runs an explicit list of agents under one of two protocols and collects
//! one response per agent:
//!
//! - **TurnOrder**: strictly sequential; each agent sees the accumulated
//!   `"\n<name>: <content>"` lines of the agents before it.
//! - **FreeForm**: every agent runs concurrently on the same initial context.
//!
//! A failing or panicking agent never aborts the batch under either protocol:
//! its entry becomes an error [`Response`] with confidence `0.0`. Agent
//! confidences are clamped into `[0.0, 1.0]` on the way in.

use crate::ports::agent::{Agent, SharedContext, display_name, render_context};
use crate::ports::progress::{CollaborationProgress, NoProgress};
use conclave_domain::{ConversationMode, Request, Response, ResponseMap};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Context key consulted when no explicit user input is given
pub const LATEST_INPUT_KEY: &str = "latest_input";

/// Request type used when the caller supplies no base request
pub const COLLABORATION_REQUEST_TYPE: &str = "collaboration";

/// Error recorded for an agent whose task panicked or was cancelled
pub const TASK_ABORTED: &str = "agent task aborted";

/// Input for the Collaborate use case
#[derive(Clone)]
pub struct CollaborateInput {
    /// Initial context, rendered into the string every agent starts from
    pub context: SharedContext,
    /// Participants, in invocation order
    pub agents: Vec<Arc<dyn Agent>>,
    /// Explicit query; falls back to [`LATEST_INPUT_KEY`] in `context`
    pub user_input: Option<String>,
    pub mode: ConversationMode,
    /// Base request whose type, context and metadata are passed through
    pub request: Option<Request>,
}

impl CollaborateInput {
    pub fn new(agents: Vec<Arc<dyn Agent>>, mode: ConversationMode) -> Self {
        Self {
            context: SharedContext::new(),
            agents,
            user_input: None,
            mode,
            request: None,
        }
    }

    pub fn with_context(mut self, context: SharedContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_user_input(mut self, input: impl Into<String>) -> Self {
        self.user_input = Some(input.into());
        self
    }

    pub fn with_request(mut self, request: Request) -> Self {
        self.request = Some(request);
        self
    }

    /// The query every agent answers: user input, else the latest input in
    /// the context, else empty
    pub fn acting_query(&self) -> String {
        if let Some(input) = &self.user_input {
            return input.clone();
        }
        match self.context.get(LATEST_INPUT_KEY) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    fn build_request(&self) -> Request {
        let mut request = self
            .request
            .clone()
            .unwrap_or_else(|| Request::new("", COLLABORATION_REQUEST_TYPE));
        request.query = self.acting_query();
        request
    }
}

/// Use case for running one collaboration round
#[derive(Debug, Default, Clone, Copy)]
pub struct CollaborateUseCase;

impl CollaborateUseCase {
    pub fn new() -> Self {
        Self
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: CollaborateInput) -> ResponseMap {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: CollaborateInput,
        progress: &dyn CollaborationProgress,
    ) -> ResponseMap {
        let request = input.build_request();
        let context = render_context(&input.context);

        info!(
            mode = %input.mode,
            agents = input.agents.len(),
            "Starting collaboration"
        );
        progress.on_collaboration_start(input.mode, input.agents.len());

        let responses = match input.mode {
            ConversationMode::TurnOrder => {
                Self::turn_order(&input.agents, &request, context, progress).await
            }
            ConversationMode::FreeForm => {
                Self::free_form(&input.agents, request, context, progress).await
            }
        };

        progress.on_collaboration_complete(input.mode);
        responses
    }

    async fn turn_order(
        agents: &[Arc<dyn Agent>],
        request: &Request,
        mut context: String,
        progress: &dyn CollaborationProgress,
    ) -> ResponseMap {
        let request = Arc::new(request.clone());
        let mut responses = ResponseMap::new();

        for agent in agents {
            let name = display_name(agent.as_ref());
            let task = {
                let agent = Arc::clone(agent);
                let request = Arc::clone(&request);
                let context = context.clone();
                tokio::spawn(async move { agent.process(&request, &context).await })
            };

            match task.await {
                Ok(Ok(response)) => {
                    debug!(
                        agent = %name,
                        confidence = response.confidence,
                        "[turn-order] responded"
                    );
                    progress.on_agent_complete(&name, !response.is_error());
                    context = format!("{}\n{}: {}", context, name, response.content);
                    responses.insert(name.clone(), Self::stamp(response, &name));
                }
                Ok(Err(e)) => {
                    warn!(agent = %name, "[turn-order] failed: {}", e);
                    progress.on_agent_complete(&name, false);
                    let failure = Response::agent_failure(e.to_string()).with_agent_name(&name);
                    responses.insert(name, failure);
                }
                Err(e) => {
                    warn!(agent = %name, "Agent task join error: {}", e);
                    progress.on_agent_complete(&name, false);
                    let failure = Response::agent_failure(TASK_ABORTED).with_agent_name(&name);
                    responses.insert(name, failure);
                }
            }
        }

        responses
    }

    async fn free_form(
        agents: &[Arc<dyn Agent>],
        request: Request,
        context: String,
        progress: &dyn CollaborationProgress,
    ) -> ResponseMap {
        let names: Vec<String> = agents.iter().map(|a| display_name(a.as_ref())).collect();
        let request = Arc::new(request);
        let context: Arc<str> = Arc::from(context);

        let mut join_set = JoinSet::new();
        for (index, agent) in agents.iter().enumerate() {
            let agent = Arc::clone(agent);
            let request = Arc::clone(&request);
            let context = Arc::clone(&context);
            join_set.spawn(async move {
                let result = agent.process(&request, &context).await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<Response>> = vec![None; agents.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, Ok(response))) => {
                    debug!(
                        agent = %names[index],
                        confidence = response.confidence,
                        "[free-form] responded"
                    );
                    progress.on_agent_complete(&names[index], !response.is_error());
                    slots[index] = Some(Self::stamp(response, &names[index]));
                }
                Ok((index, Err(e))) => {
                    warn!(agent = %names[index], "[free-form] failed: {}", e);
                    progress.on_agent_complete(&names[index], false);
                    let failure =
                        Response::agent_failure(e.to_string()).with_agent_name(&names[index]);
                    slots[index] = Some(failure);
                }
                Err(e) => {
                    warn!("Agent task join error: {}", e);
                }
            }
        }

        // Insert in list order so duplicate names overwrite deterministically
        let mut responses = ResponseMap::new();
        for (index, slot) in slots.into_iter().enumerate() {
            let response = slot.unwrap_or_else(|| {
                Response::agent_failure(TASK_ABORTED).with_agent_name(&names[index])
            });
            responses.insert(names[index].clone(), response);
        }
        responses
    }

    /// Clamp the agent's confidence and fill in its name when missing
    fn stamp(response: Response, name: &str) -> Response {
        let response = response.normalized();
        if response.agent_name.is_some() {
            response
        } else {
            response.with_agent_name(name)
        }
    }
}
