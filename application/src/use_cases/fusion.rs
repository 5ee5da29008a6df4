//! Fusion controller
//!
//! State machine around the composite pipelines run for `Complex` and
//! `Transcendent` requests:
//!
//! ```text
//! Individual ──activate──► Fusing ──ok──► Transcendent
//!                              └────err──► Individual (error re-raised)
//! ```
//!
//! Each [`FusionMode`] maps to a [`FusionStrategy`]. Strategies are looked up
//! by mode, so new or replacement pipelines can be plugged in through
//! [`FusionController::with_strategy`] without touching the state machine.

use crate::ports::agent::{Agent, SharedContext, display_name};
use crate::ports::text_generation::{GenerationError, TextGenerationClient};
use crate::use_cases::collaborate::{CollaborateInput, CollaborateUseCase};
use async_trait::async_trait;
use conclave_domain::consensus::{aggregate, best_response, synthesize};
use conclave_domain::orchestration::fusion::FUSION_MODE_KEY;
use conclave_domain::{
    AgentMessage, ConversationMode, FusionMode, FusionState, ORCHESTRATOR_NAME, Request,
    ResponseMap, capability, clamp_confidence,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

/// Errors raised by a fusion pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    #[error("{mode} fusion has no participating agents")]
    NoAgents { mode: FusionMode },

    #[error("{mode} fusion failed: {message}")]
    PipelineFailed { mode: FusionMode, message: String },

    #[error("No strategy registered for {0}")]
    UnknownStrategy(FusionMode),

    #[error("{mode} fusion synthesis failed: {source}")]
    Generation {
        mode: FusionMode,
        #[source]
        source: GenerationError,
    },
}

impl FusionError {
    pub fn mode(&self) -> FusionMode {
        match self {
            FusionError::NoAgents { mode }
            | FusionError::PipelineFailed { mode, .. }
            | FusionError::Generation { mode, .. } => *mode,
            FusionError::UnknownStrategy(mode) => *mode,
        }
    }
}

/// What a pipeline produced
#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutput {
    pub mode: FusionMode,
    pub content: String,
    pub confidence: f32,
    /// Per-agent responses the result was built from
    pub contributions: ResponseMap,
}

/// Collaborators handed to every pipeline
#[derive(Clone)]
pub struct FusionContext {
    /// Participating agents in priority order
    pub agents: Vec<Arc<dyn Agent>>,
    pub generator: Arc<dyn TextGenerationClient>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl FusionContext {
    pub fn new(agents: Vec<Arc<dyn Agent>>, generator: Arc<dyn TextGenerationClient>) -> Self {
        Self {
            agents,
            generator,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Agents advertising `capability`, or every agent if none does
    fn with_capability(&self, capability: &str) -> Vec<Arc<dyn Agent>> {
        let matching: Vec<_> = self
            .agents
            .iter()
            .filter(|agent| agent.identity().has_capability(capability))
            .cloned()
            .collect();
        if matching.is_empty() {
            self.agents.clone()
        } else {
            matching
        }
    }

    /// Agents not advertising `capability`
    fn without_capability(&self, capability: &str) -> Vec<Arc<dyn Agent>> {
        self.agents
            .iter()
            .filter(|agent| !agent.identity().has_capability(capability))
            .cloned()
            .collect()
    }
}

/// One composite pipeline
#[async_trait]
pub trait FusionStrategy: Send + Sync {
    fn mode(&self) -> FusionMode;

    async fn execute(
        &self,
        request: &Request,
        context: &FusionContext,
    ) -> Result<FusionOutput, FusionError>;
}

/// Runs the strategy selected for each request and tracks [`FusionState`]
pub struct FusionController {
    strategies: HashMap<FusionMode, Arc<dyn FusionStrategy>>,
    state: watch::Sender<FusionState>,
}

impl Default for FusionController {
    fn default() -> Self {
        Self::new()
    }
}

impl FusionController {
    /// Controller with the four built-in pipelines
    pub fn new() -> Self {
        Self::empty()
            .with_strategy(Arc::new(HyperCreation))
            .with_strategy(Arc::new(ChronoSculptor))
            .with_strategy(Arc::new(AdaptiveGenesis::default()))
            .with_strategy(Arc::new(InterfaceForge))
    }

    /// Controller with no pipelines registered
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
            state: watch::channel(FusionState::Individual).0,
        }
    }

    /// Register a strategy, replacing any existing one for its mode
    pub fn with_strategy(mut self, strategy: Arc<dyn FusionStrategy>) -> Self {
        self.strategies.insert(strategy.mode(), strategy);
        self
    }

    pub fn state(&self) -> FusionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<FusionState> {
        self.state.subscribe()
    }

    /// Return to `Individual`
    pub fn reset(&self) {
        self.state.send_replace(FusionState::Individual);
    }

    /// Select a mode for `request` and run its pipeline.
    ///
    /// On failure the state returns to `Individual` and the error is handed
    /// back to the caller.
    pub async fn activate(
        &self,
        request: &Request,
        context: &FusionContext,
    ) -> Result<FusionOutput, FusionError> {
        let mode = FusionMode::select(request);
        info!(mode = %mode, "Activating fusion");
        self.state.send_replace(FusionState::Fusing);

        let result = match self.strategies.get(&mode) {
            Some(strategy) => strategy.execute(request, context).await,
            None => Err(FusionError::UnknownStrategy(mode)),
        };

        match &result {
            Ok(output) => {
                info!(mode = %mode, confidence = output.confidence, "Fusion complete");
                self.state.send_replace(FusionState::Transcendent);
            }
            Err(e) => {
                warn!(mode = %mode, "Fusion failed: {}", e);
                self.state.send_replace(FusionState::Individual);
            }
        }
        result
    }
}

// ==================== Built-in Strategies ====================

fn stage_context(mode: FusionMode, stage: &str) -> SharedContext {
    let mut context = SharedContext::new();
    context.insert(FUSION_MODE_KEY.to_string(), mode.as_str().into());
    context.insert("stage".to_string(), stage.into());
    context
}

/// Fail the pipeline if no response in `responses` succeeded
fn require_success(mode: FusionMode, responses: &ResponseMap) -> Result<(), FusionError> {
    if responses.values().any(|r| r.is_success()) {
        return Ok(());
    }
    let message = responses
        .values()
        .find_map(|r| r.error.clone())
        .unwrap_or_else(|| "no agent produced a response".to_string());
    Err(FusionError::PipelineFailed { mode, message })
}

fn mean_success_confidence(responses: &ResponseMap) -> f32 {
    let successes: Vec<f32> = responses
        .values()
        .filter(|r| r.is_success())
        .map(|r| r.confidence)
        .collect();
    if successes.is_empty() {
        return 0.0;
    }
    clamp_confidence(successes.iter().sum::<f32>() / successes.len() as f32)
}

/// Every agent ideates independently; the most confident idea wins
pub struct HyperCreation;

#[async_trait]
impl FusionStrategy for HyperCreation {
    fn mode(&self) -> FusionMode {
        FusionMode::HyperCreation
    }

    async fn execute(
        &self,
        request: &Request,
        context: &FusionContext,
    ) -> Result<FusionOutput, FusionError> {
        let mode = self.mode();
        if context.agents.is_empty() {
            return Err(FusionError::NoAgents { mode });
        }

        let input = CollaborateInput::new(context.agents.clone(), ConversationMode::FreeForm)
            .with_context(stage_context(mode, "ideation"))
            .with_request(request.clone())
            .with_user_input(&request.query);
        let responses = CollaborateUseCase::new().execute(input).await;
        require_success(mode, &responses)?;

        let best = best_response(responses.values())
            .cloned()
            .ok_or(FusionError::NoAgents { mode })?;
        Ok(FusionOutput {
            mode,
            content: best.content,
            confidence: best.confidence,
            contributions: responses,
        })
    }
}

/// Agents refine the answer one after another; the last refinement wins
pub struct ChronoSculptor;

#[async_trait]
impl FusionStrategy for ChronoSculptor {
    fn mode(&self) -> FusionMode {
        FusionMode::ChronoSculptor
    }

    async fn execute(
        &self,
        request: &Request,
        context: &FusionContext,
    ) -> Result<FusionOutput, FusionError> {
        let mode = self.mode();
        if context.agents.is_empty() {
            return Err(FusionError::NoAgents { mode });
        }

        let input = CollaborateInput::new(context.agents.clone(), ConversationMode::TurnOrder)
            .with_context(stage_context(mode, "refinement"))
            .with_request(request.clone())
            .with_user_input(&request.query);
        let responses = CollaborateUseCase::new().execute(input).await;
        require_success(mode, &responses)?;

        // Map iteration is by name; the last refinement is the last agent in turn order
        let last = context
            .agents
            .iter()
            .rev()
            .filter_map(|agent| responses.get(&display_name(agent.as_ref())))
            .find(|r| r.is_success())
            .map(|r| r.content.clone())
            .unwrap_or_default();

        Ok(FusionOutput {
            mode,
            content: last,
            confidence: mean_success_confidence(&responses),
            contributions: responses,
        })
    }
}

/// Several independent rounds reduced to a per-agent consensus
pub struct AdaptiveGenesis {
    pub rounds: usize,
}

impl Default for AdaptiveGenesis {
    fn default() -> Self {
        Self { rounds: 3 }
    }
}

#[async_trait]
impl FusionStrategy for AdaptiveGenesis {
    fn mode(&self) -> FusionMode {
        FusionMode::AdaptiveGenesis
    }

    async fn execute(
        &self,
        request: &Request,
        context: &FusionContext,
    ) -> Result<FusionOutput, FusionError> {
        let mode = self.mode();
        if context.agents.is_empty() {
            return Err(FusionError::NoAgents { mode });
        }

        let mut rounds = Vec::with_capacity(self.rounds.max(1));
        for round in 0..self.rounds.max(1) {
            let input = CollaborateInput::new(context.agents.clone(), ConversationMode::FreeForm)
                .with_context(stage_context(mode, &format!("round-{}", round + 1)))
                .with_request(request.clone())
                .with_user_input(&request.query);
            rounds.push(CollaborateUseCase::new().execute(input).await);
        }

        let consensus = aggregate(&rounds);
        require_success(mode, &consensus)?;

        let messages: Vec<AgentMessage> = consensus
            .iter()
            .filter(|(_, r)| r.is_success())
            .map(|(name, r)| AgentMessage::from_response(name, r))
            .collect();
        Ok(FusionOutput {
            mode,
            content: synthesize(&messages, ORCHESTRATOR_NAME),
            confidence: mean_success_confidence(&consensus),
            contributions: consensus,
        })
    }
}

/// Creative agents draft, the others review in turn, the text backend renders
pub struct InterfaceForge;

#[async_trait]
impl FusionStrategy for InterfaceForge {
    fn mode(&self) -> FusionMode {
        FusionMode::InterfaceForge
    }

    async fn execute(
        &self,
        request: &Request,
        context: &FusionContext,
    ) -> Result<FusionOutput, FusionError> {
        let mode = self.mode();
        if context.agents.is_empty() {
            return Err(FusionError::NoAgents { mode });
        }

        let drafters = context.with_capability(capability::CREATIVE);
        let input = CollaborateInput::new(drafters, ConversationMode::FreeForm)
            .with_context(stage_context(mode, "draft"))
            .with_request(request.clone())
            .with_user_input(&request.query);
        let drafts = CollaborateUseCase::new().execute(input).await;
        require_success(mode, &drafts)?;
        let draft = best_response(drafts.values())
            .map(|r| r.content.clone())
            .unwrap_or_default();

        let mut contributions = drafts;
        let reviewers = context.without_capability(capability::CREATIVE);
        let mut reviews = String::new();
        if !reviewers.is_empty() {
            let mut review_context = stage_context(mode, "review");
            review_context.insert("draft".to_string(), draft.clone().into());
            let input = CollaborateInput::new(reviewers, ConversationMode::TurnOrder)
                .with_context(review_context)
                .with_request(request.clone())
                .with_user_input(&request.query);
            let review_map = CollaborateUseCase::new().execute(input).await;
            reviews = review_map
                .iter()
                .filter(|(_, r)| r.is_success())
                .map(|(name, r)| format!("{}: {}", name, r.content))
                .collect::<Vec<_>>()
                .join("\n");
            contributions.extend(review_map);
        }

        let prompt = format!(
            "Render an interface for: {}\nDraft:\n{}\nReviews:\n{}",
            request.query, draft, reviews
        );
        let rendered = context
            .generator
            .generate(&prompt, context.temperature, context.max_tokens)
            .await
            .map_err(|source| FusionError::Generation { mode, source })?;

        Ok(FusionOutput {
            mode,
            content: rendered.unwrap_or(draft),
            confidence: mean_success_confidence(&contributions),
            contributions,
        })
    }
}
