//! Prompt-driven persona agents

use crate::config::FileAgentConfig;
use async_trait::async_trait;
use conclave_application::ports::agent::render_context;
use conclave_application::{
    Agent, AgentError, ContextAware, GenerationError, SharedContext, TextGenerationClient,
};
use conclave_domain::{AgentIdentity, Request, Response, capability, clamp_confidence};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// An agent whose behavior is a persona prompt sent to a text backend
pub struct PersonaAgent {
    identity: AgentIdentity,
    persona: String,
    confidence: f32,
    context_aware: bool,
    generator: Arc<dyn TextGenerationClient>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    shared: RwLock<SharedContext>,
}

impl PersonaAgent {
    pub fn new(config: &FileAgentConfig, generator: Arc<dyn TextGenerationClient>) -> Self {
        Self {
            identity: AgentIdentity::new(config.name.trim())
                .with_capabilities(config.capabilities.iter().cloned()),
            persona: config.persona.clone(),
            confidence: clamp_confidence(config.confidence),
            context_aware: config.context_aware,
            generator,
            temperature: None,
            max_tokens: None,
            shared: RwLock::new(SharedContext::new()),
        }
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Last context pushed by the orchestrator
    pub fn shared_context(&self) -> SharedContext {
        self.shared
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn prompt(&self, request: &Request, context: &str) -> String {
        let mut prompt = String::new();
        if !self.persona.trim().is_empty() {
            prompt.push_str(self.persona.trim());
            prompt.push_str("\n\n");
        }

        let shared = self.shared_context();
        if !shared.is_empty() {
            prompt.push_str(&format!("Shared context: {}\n", render_context(&shared)));
        }
        if !context.trim().is_empty() && context != "{}" {
            prompt.push_str(&format!("Context: {}\n", context));
        }

        prompt.push_str(&format!("\nRequest ({}): {}", request.request_type, request.query));
        prompt
    }
}

impl ContextAware for PersonaAgent {
    fn set_context(&self, context: &SharedContext) {
        *self.shared.write().unwrap_or_else(PoisonError::into_inner) = context.clone();
    }
}

#[async_trait]
impl Agent for PersonaAgent {
    fn name(&self) -> Option<String> {
        Some(self.identity.name.clone())
    }

    fn identity(&self) -> AgentIdentity {
        self.identity.clone()
    }

    async fn process(&self, request: &Request, context: &str) -> Result<Response, AgentError> {
        let prompt = self.prompt(request, context);
        debug!(agent = %self.identity.name, prompt_len = prompt.len(), "Generating");

        let text = self
            .generator
            .generate(&prompt, self.temperature, self.max_tokens)
            .await
            .map_err(|e| match e {
                GenerationError::ConnectionError(msg) => AgentError::Unavailable(msg),
                other => AgentError::Backend(other.to_string()),
            })?
            .ok_or_else(|| AgentError::Backend("empty completion".to_string()))?;

        Ok(Response::success(text, self.confidence).with_agent_name(&self.identity.name))
    }

    fn as_context_aware(&self) -> Option<&dyn ContextAware> {
        if self.context_aware { Some(self) } else { None }
    }
}

/// Roster used when the configuration names no agents
pub fn default_roster() -> Vec<FileAgentConfig> {
    let agent = |name: &str, tag: &str, priority: u8, persona: &str, confidence: f32| {
        FileAgentConfig {
            name: name.to_string(),
            capabilities: vec![tag.to_string()],
            priority,
            persona: persona.to_string(),
            confidence,
            context_aware: true,
        }
    };
    vec![
        agent(
            "muse",
            capability::CREATIVE,
            1,
            "You are Muse, an inventive designer. Answer with bold, concrete ideas.",
            0.8,
        ),
        agent(
            "sentinel",
            capability::SECURITY,
            2,
            "You are Sentinel, a careful security reviewer. Point out risks first.",
            0.75,
        ),
        agent(
            "sage",
            capability::GENERALIST,
            3,
            "You are Sage, a pragmatic generalist. Answer plainly and briefly.",
            0.7,
        ),
    ]
}

/// Instantiate persona agents for every named roster entry
pub fn build_roster(
    configs: &[FileAgentConfig],
    generator: Arc<dyn TextGenerationClient>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
) -> Vec<(String, Arc<PersonaAgent>)> {
    configs
        .iter()
        .filter(|config| !config.name.trim().is_empty())
        .map(|config| {
            let agent = PersonaAgent::new(config, Arc::clone(&generator))
                .with_sampling(temperature, max_tokens);
            (config.name.trim().to_string(), Arc::new(agent))
        })
        .collect()
}
