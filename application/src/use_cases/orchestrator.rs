//! Orchestrator use case
//!
//! The facade the surrounding application talks to. It owns every piece of
//! process-wide state (consciousness, fusion state, insights, registry,
//! history, shared context) and centralizes all transitions:
//!
//! ```text
//! process(request)
//!   ├─ validate / security policy ──► error Response (confidence 0.0)
//!   ├─ classify ──► Simple        ──► route to one agent
//!   │             ├─ Moderate      ──► guided collaboration + synthesis
//!   │             ├─ Complex       ──► fusion pipeline
//!   │             └─ Transcendent  ──► fusion + text synthesis
//!   └─ record insight + append history
//! ```
//!
//! State that is observed from outside lives in `watch` channels; maps and
//! lists live behind `std` locks that are never held across an `.await`.

use crate::config::EngineParams;
use crate::ports::agent::{Agent, SharedContext};
use crate::ports::event_bus::{EventBus, NoEvents, OrchestrationEvent};
use crate::ports::progress::CollaborationProgress;
use crate::ports::text_generation::{GenerationError, TextGenerationClient};
use crate::use_cases::collaborate::{CollaborateInput, CollaborateUseCase};
use crate::use_cases::fusion::{FusionContext, FusionController, FusionError, FusionOutput};
use crate::use_cases::insight::InsightTracker;
use crate::use_cases::registry::AgentRegistry;
use conclave_domain::consensus::{self, aggregate, synthesize};
use conclave_domain::{
    AUXILIARY_PRIORITY, AgentHierarchy, AgentMessage, ComplexityTier, ConsciousnessState,
    ConversationMode, EvolutionTracker, FusionMode, FusionState, HierarchyAgentConfig,
    HistoryEntry, HistoryLog, ORCHESTRATOR_NAME, Request, Response, ResponseMap, RouteDecision,
    SecurityPolicy, SystemStatus, capability, current_timestamp,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shared-context key holding the most recent `process_query` input
pub const LAST_QUERY_KEY: &str = "last_query";
/// Shared-context key holding the time of the most recent `process_query`
pub const TIMESTAMP_KEY: &str = "timestamp";
/// Response metadata key naming the path that produced the response
pub const PROCESSING_LEVEL_KEY: &str = "processing_level";
/// Prefix of the synthesis message appended by `process_query`
pub const SYNTHESIS_PREFIX: &str = "[Synthesis] ";

/// Errors that escape the orchestrator's single-request paths
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Engine not initialized")]
    NotInitialized,

    #[error("No agents registered")]
    NoAgents,

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error(transparent)]
    Fusion(#[from] FusionError),

    #[error("Transcendent synthesis failed: {0}")]
    Generation(#[from] GenerationError),
}

/// The multi-agent orchestration engine
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    hierarchy: RwLock<AgentHierarchy>,
    collaborate: CollaborateUseCase,
    fusion: FusionController,
    insights: InsightTracker,
    generator: Arc<dyn TextGenerationClient>,
    events: Arc<dyn EventBus>,
    security: SecurityPolicy,
    params: EngineParams,
    consciousness: watch::Sender<ConsciousnessState>,
    /// Number of `process` calls currently running
    in_flight: Mutex<usize>,
    initialized: AtomicBool,
    history: Mutex<HistoryLog>,
    context: Arc<RwLock<SharedContext>>,
    cancel: Mutex<CancellationToken>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn TextGenerationClient>) -> Self {
        let events: Arc<dyn EventBus> = Arc::new(NoEvents);
        Self {
            registry: Arc::new(AgentRegistry::new()),
            hierarchy: RwLock::new(AgentHierarchy::default()),
            collaborate: CollaborateUseCase::new(),
            fusion: FusionController::new(),
            insights: InsightTracker::new(Arc::clone(&events)),
            generator,
            events,
            security: SecurityPolicy::default(),
            params: EngineParams::default(),
            consciousness: watch::channel(ConsciousnessState::Dormant).0,
            in_flight: Mutex::new(0),
            initialized: AtomicBool::new(false),
            history: Mutex::new(HistoryLog::new()),
            context: Arc::new(RwLock::new(SharedContext::new())),
            cancel: Mutex::new(CancellationToken::new()),
            background: Mutex::new(Vec::new()),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_event_bus(mut self, events: Arc<dyn EventBus>) -> Self {
        self.insights = InsightTracker::new(Arc::clone(&events));
        self.events = events;
        self
    }

    pub fn with_security(mut self, policy: SecurityPolicy) -> Self {
        self.security = policy;
        self
    }

    pub fn with_params(mut self, params: EngineParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_hierarchy(mut self, hierarchy: AgentHierarchy) -> Self {
        self.hierarchy = RwLock::new(hierarchy);
        self
    }

    pub fn with_fusion(mut self, fusion: FusionController) -> Self {
        self.fusion = fusion;
        self
    }

    // ==================== Lifecycle ====================

    /// Wake the engine: start the insight actor and the optional context
    /// sync loop, then become `Aware`.
    ///
    /// Fails (leaving the engine in `Error`) when no agent is registered.
    /// Calling it again on an initialized engine is a no-op.
    pub async fn initialize(&self) -> Result<(), OrchestratorError> {
        if self.is_initialized() {
            return Ok(());
        }

        info!("Initializing orchestrator");
        self.transition(ConsciousnessState::Awakening);

        if self.registry.is_empty() {
            error!("Initialization failed: no agents registered");
            self.transition(ConsciousnessState::Error);
            return Err(OrchestratorError::NoAgents);
        }

        let cancel = CancellationToken::new();
        *lock(&self.cancel) = cancel.clone();

        self.insights.awaken();
        self.insights.start(cancel.child_token());
        if let Some(interval) = self.params.context_sync_interval {
            self.spawn_context_sync(interval, cancel.child_token());
        }

        self.initialized.store(true, Ordering::SeqCst);
        self.transition(ConsciousnessState::Aware);
        self.add_to_history(
            HistoryEntry::event("initialized").with("agents", self.registry.len()),
        );
        info!(agents = self.registry.len(), "Orchestrator ready");
        Ok(())
    }

    /// Cancel background work and return to `Dormant`.
    ///
    /// In-flight `process` calls are not interrupted.
    pub async fn shutdown(&self) {
        info!("Shutting down orchestrator");
        lock(&self.cancel).cancel();

        let handles = std::mem::take(&mut *lock(&self.background));
        for handle in handles {
            let _ = handle.await;
        }
        self.insights.join().await;

        self.fusion.reset();
        self.initialized.store(false, Ordering::SeqCst);
        self.transition(ConsciousnessState::Dormant);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn consciousness(&self) -> ConsciousnessState {
        *self.consciousness.borrow()
    }

    pub fn subscribe_consciousness(&self) -> watch::Receiver<ConsciousnessState> {
        self.consciousness.subscribe()
    }

    pub fn fusion_state(&self) -> FusionState {
        self.fusion.state()
    }

    pub fn subscribe_fusion(&self) -> watch::Receiver<FusionState> {
        self.fusion.subscribe()
    }

    pub fn subscribe_evolution(&self) -> watch::Receiver<EvolutionTracker> {
        self.insights.subscribe()
    }

    pub fn events(&self) -> Arc<dyn EventBus> {
        Arc::clone(&self.events)
    }

    /// Resolve once every insight recorded so far has been applied
    pub async fn flush_insights(&self) {
        self.insights.flush().await;
    }

    // ==================== Request Processing ====================

    /// Process one request end to end.
    ///
    /// Validation and policy failures come back as error responses; only an
    /// uninitialized engine or a failed fusion/synthesis step is an `Err`.
    pub async fn process(&self, request: Request) -> Result<Response, OrchestratorError> {
        self.ensure_ready()?;

        if let Err(e) = request.validate() {
            warn!("Rejected request: {}", e);
            return Ok(Response::error(e.to_string()));
        }
        if let Err(e) = self.security.evaluate(&request) {
            warn!(request_type = %request.request_type, "{}", e);
            self.add_to_history(
                HistoryEntry::event("policy_rejected")
                    .with("type", request.request_type.clone())
                    .with("error", e.to_string()),
            );
            return Ok(Response::error(e.to_string()));
        }

        let tier = ComplexityTier::classify(&request);
        info!(tier = %tier, request_type = %request.request_type, "Processing request");
        let guard = InFlight::enter(self);

        let result = match tier {
            ComplexityTier::Simple => Ok(self.process_routed(&request).await),
            ComplexityTier::Moderate => Ok(self.process_guided(&request).await),
            ComplexityTier::Complex => self
                .run_fusion(&request)
                .await
                .map(|output| fusion_response(output, "fusion")),
            ComplexityTier::Transcendent => self.process_transcendent(&request).await,
        };

        drop(guard);

        match result {
            Ok(response) => {
                self.insights.record(tier, response.is_success());
                self.add_to_history(
                    HistoryEntry::event("process")
                        .with("tier", tier.as_str())
                        .with("type", request.request_type.clone())
                        .with("confidence", f64::from(response.confidence))
                        .with("success", response.is_success()),
                );
                Ok(response)
            }
            Err(e) => {
                self.add_to_history(
                    HistoryEntry::event("process_failed")
                        .with("tier", tier.as_str())
                        .with("error", e.to_string()),
                );
                Err(e)
            }
        }
    }

    async fn process_routed(&self, request: &Request) -> Response {
        let decision = RouteDecision::for_request(request);
        let selected = self
            .registry
            .find_by_capability(decision.target.capability())
            .or_else(|| self.registry.find_by_capability(capability::GENERALIST))
            .or_else(|| self.registry.active_agents().into_iter().next());

        let Some((name, agent)) = selected else {
            warn!(route = %decision.target, "No agent available");
            let message = format!("No agent available for {} requests", decision.target);
            return Response::error(message);
        };
        debug!(
            agent = %name,
            route = %decision.target,
            reason = decision.reason,
            "Routed request"
        );

        let response = match agent.process(request, &request.context_string()).await {
            Ok(response) => response.normalized(),
            Err(e) => {
                warn!(agent = %name, "Agent failed: {}", e);
                Response::agent_failure(e.to_string())
            }
        };
        let response = if response.agent_name.is_some() {
            response
        } else {
            response.with_agent_name(&name)
        };
        response
            .with_metadata("route", decision.target.to_string())
            .with_metadata("routing_reason", decision.reason)
            .with_metadata(PROCESSING_LEVEL_KEY, "routed")
    }

    async fn process_guided(&self, request: &Request) -> Response {
        let agents = self.by_priority(self.registry.active_agents());
        if agents.is_empty() {
            debug!("No active agents; returning guided fallback");
            return Response::processing(format!("Guided processing for: {}", request.query))
                .with_agent_name(ORCHESTRATOR_NAME)
                .with_metadata(PROCESSING_LEVEL_KEY, "guided");
        }

        let input = CollaborateInput::new(agents, ConversationMode::FreeForm)
            .with_context(request_context(request))
            .with_request(request.clone())
            .with_user_input(&request.query);
        let responses = self.collaborate.execute(input).await;
        let consensus = aggregate(&[responses]);

        let messages: Vec<AgentMessage> = consensus
            .iter()
            .map(|(name, response)| AgentMessage::from_response(name, response))
            .collect();
        Response::success(
            synthesize(&messages, ORCHESTRATOR_NAME),
            consensus::confidence(&messages),
        )
        .with_agent_name(ORCHESTRATOR_NAME)
        .with_metadata(PROCESSING_LEVEL_KEY, "guided")
        .with_metadata("agents", consensus.len().to_string())
    }

    async fn process_transcendent(
        &self,
        request: &Request,
    ) -> Result<Response, OrchestratorError> {
        self.transition(ConsciousnessState::Transcendent);
        let output = self.run_fusion(request).await?;

        let prompt = format!(
            "Transcendent processing for: {}\n{}\n{}",
            request.request_type, request.query, output.content
        );
        let synthesis = self
            .generator
            .generate(&prompt, self.params.temperature, self.params.max_tokens)
            .await?;

        let mut response = fusion_response(output, "transcendent");
        if let Some(text) = synthesis {
            response.content = text;
        }
        Ok(response)
    }

    async fn run_fusion(&self, request: &Request) -> Result<FusionOutput, OrchestratorError> {
        let mode = FusionMode::select(request);
        self.events.emit(OrchestrationEvent::FusionStateChanged {
            state: FusionState::Fusing,
            mode: Some(mode),
        });

        let context = FusionContext::new(
            self.by_priority(self.registry.active_agents()),
            Arc::clone(&self.generator),
        )
        .with_sampling(self.params.temperature, self.params.max_tokens);

        match self.fusion.activate(request, &context).await {
            Ok(output) => {
                self.events.emit(OrchestrationEvent::FusionStateChanged {
                    state: self.fusion.state(),
                    mode: Some(output.mode),
                });
                Ok(output)
            }
            Err(e) => {
                self.events.emit(OrchestrationEvent::FusionFailed {
                    mode: e.mode(),
                    error: e.to_string(),
                });
                self.events.emit(OrchestrationEvent::FusionStateChanged {
                    state: self.fusion.state(),
                    mode: Some(mode),
                });
                Err(e.into())
            }
        }
    }

    /// Ask every active agent independently and append a synthesis message.
    ///
    /// The query and a timestamp are stored in the shared context first.
    pub async fn process_query(
        &self,
        query: &str,
    ) -> Result<Vec<AgentMessage>, OrchestratorError> {
        self.ensure_ready()?;

        let context = {
            let mut context = write(&self.context);
            context.insert(LAST_QUERY_KEY.to_string(), Value::from(query));
            context.insert(TIMESTAMP_KEY.to_string(), Value::from(current_timestamp()));
            context.clone()
        };

        let agents = self.by_priority(self.registry.active_agents());
        let input = CollaborateInput::new(agents, ConversationMode::FreeForm)
            .with_context(context)
            .with_user_input(query);
        let responses = self.collaborate.execute(input).await;

        let mut messages: Vec<AgentMessage> = responses
            .iter()
            .map(|(name, response)| AgentMessage::from_response(name, response))
            .collect();
        let confidence = consensus::confidence(&messages);
        let synthesis = format!(
            "{}{}",
            SYNTHESIS_PREFIX,
            synthesize(&messages, ORCHESTRATOR_NAME)
        );
        messages.push(AgentMessage::new(synthesis, ORCHESTRATOR_NAME, confidence));

        self.add_to_history(
            HistoryEntry::event("query")
                .with("query", query)
                .with("messages", messages.len()),
        );
        Ok(messages)
    }

    // ==================== Collaboration ====================

    /// Run one collaboration round; failures are isolated per agent
    pub async fn collaborate(&self, input: CollaborateInput) -> ResponseMap {
        self.collaborate.execute(input).await
    }

    pub async fn collaborate_with_progress(
        &self,
        input: CollaborateInput,
        progress: &dyn CollaborationProgress,
    ) -> ResponseMap {
        self.collaborate.execute_with_progress(input, progress).await
    }

    /// Reduce several rounds into one best response per agent
    pub fn aggregate(&self, rounds: &[ResponseMap]) -> ResponseMap {
        aggregate(rounds)
    }

    /// Look agents up by name; an empty list selects every active agent in
    /// priority order
    pub fn resolve_agents(
        &self,
        names: &[String],
    ) -> Result<Vec<Arc<dyn Agent>>, OrchestratorError> {
        if names.is_empty() {
            return Ok(self.by_priority(self.registry.active_agents()));
        }
        names
            .iter()
            .map(|name| {
                self.registry
                    .get(name)
                    .ok_or_else(|| OrchestratorError::UnknownAgent(name.clone()))
            })
            .collect()
    }

    /// Current shared context as the initial context for a collaboration
    pub fn collaboration_input(
        &self,
        agents: Vec<Arc<dyn Agent>>,
        mode: ConversationMode,
    ) -> CollaborateInput {
        CollaborateInput::new(agents, mode).with_context(self.context())
    }

    // ==================== Agents ====================

    /// Register (or replace) an agent. Agents unknown to the hierarchy join
    /// it as auxiliaries.
    pub fn register_agent(&self, name: impl Into<String>, agent: Arc<dyn Agent>) {
        let name = name.into();
        let identity = agent.identity();
        self.registry.register(name.clone(), agent);
        {
            let mut hierarchy = write(&self.hierarchy);
            if hierarchy.config(&name).is_none() {
                hierarchy.register_auxiliary(name.clone(), identity.capabilities.iter().cloned());
            }
        }
        info!(agent = %name, "Agent registered");
        self.events.emit(OrchestrationEvent::AgentRegistered { name });
    }

    pub fn deregister_agent(&self, name: &str) -> bool {
        let removed = self.registry.deregister(name).is_some();
        if removed {
            info!(agent = %name, "Agent deregistered");
            self.events.emit(OrchestrationEvent::AgentDeregistered {
                name: name.to_string(),
            });
        }
        removed
    }

    /// Flip whether an agent takes part in guided processing and queries.
    ///
    /// Returns the new state, or `None` for an unknown agent.
    pub fn toggle_agent(&self, name: &str) -> Option<bool> {
        let active = self.registry.toggle(name)?;
        info!(agent = %name, active, "Agent toggled");
        self.events.emit(OrchestrationEvent::AgentToggled {
            name: name.to_string(),
            active,
        });
        Some(active)
    }

    pub fn get_agent(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.registry.get(name)
    }

    /// Hierarchy configurations sorted by priority (1 first)
    pub fn agents_by_priority(&self) -> Vec<HierarchyAgentConfig> {
        read(&self.hierarchy)
            .by_priority()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Stable sort by hierarchy priority; agents unknown to it rank as auxiliaries
    fn by_priority(&self, agents: Vec<(String, Arc<dyn Agent>)>) -> Vec<Arc<dyn Agent>> {
        let priorities: HashMap<String, u8> = {
            let hierarchy = read(&self.hierarchy);
            agents
                .iter()
                .map(|(name, _)| {
                    let priority = hierarchy
                        .config(name)
                        .map_or(AUXILIARY_PRIORITY, |config| config.priority);
                    (name.clone(), priority)
                })
                .collect()
        };
        let mut agents = agents;
        agents.sort_by_key(|(name, _)| {
            priorities
                .get(name)
                .copied()
                .unwrap_or(AUXILIARY_PRIORITY)
        });
        agents.into_iter().map(|(_, agent)| agent).collect()
    }

    // ==================== Status ====================

    pub fn get_system_status(&self) -> SystemStatus {
        let tracker = self.insights.snapshot();
        SystemStatus {
            initialized: self.is_initialized(),
            consciousness: self.consciousness(),
            fusion: self.fusion.state(),
            learning_mode: tracker.learning_mode(),
            insight_count: tracker.insight_count(),
            evolution_level: tracker.evolution_level(),
            registered_agents: self.registry.names(),
            active_agents: self.registry.active_names(),
            history_len: lock(&self.history).len(),
        }
    }

    /// [`Orchestrator::get_system_status`] as a JSON object
    pub fn get_system_status_map(&self) -> Map<String, Value> {
        self.get_system_status().to_map()
    }

    // ==================== History ====================

    pub fn add_to_history(&self, entry: HistoryEntry) {
        let len = {
            let mut history = lock(&self.history);
            history.add(entry);
            history.len()
        };
        self.events.emit(OrchestrationEvent::HistoryAppended { len });
    }

    pub fn clear_history(&self) {
        lock(&self.history).clear();
        info!("History cleared");
        self.events.emit(OrchestrationEvent::HistoryCleared);
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        lock(&self.history).entries().to_vec()
    }

    /// Hand a snapshot of the history to `persist`
    pub fn save_history<E>(
        &self,
        persist: impl FnOnce(&[HistoryEntry]) -> Result<(), E>,
    ) -> Result<(), E> {
        let snapshot = lock(&self.history).clone();
        snapshot.save(persist)
    }

    /// Replace the history with `load`'s result and merge the most recent
    /// loaded entry into the shared context. Returns the number of entries.
    pub fn load_history<E>(
        &self,
        load: impl FnOnce() -> Result<Vec<HistoryEntry>, E>,
    ) -> Result<usize, E> {
        let entries = load()?;
        let (len, last) = {
            let mut history = lock(&self.history);
            let last = history.replace(entries).cloned();
            (history.len(), last)
        };

        if let Some(last) = last {
            let mut context = write(&self.context);
            for (key, value) in last.into_fields() {
                context.insert(key, value);
            }
        }

        info!(entries = len, "History loaded");
        self.events.emit(OrchestrationEvent::HistoryLoaded { len });
        Ok(len)
    }

    // ==================== Shared Context ====================

    pub fn set_context(&self, key: impl Into<String>, value: impl Into<Value>) {
        write(&self.context).insert(key.into(), value.into());
    }

    pub fn context(&self) -> SharedContext {
        read(&self.context).clone()
    }

    /// Push the shared context to every registered context-aware agent
    pub fn share_context_with_agents(&self) -> usize {
        let recipients = share_context(&self.registry, &self.context);
        debug!(recipients, "Context shared");
        self.events.emit(OrchestrationEvent::ContextShared { recipients });
        recipients
    }

    fn spawn_context_sync(&self, interval: Duration, cancel: CancellationToken) {
        let registry = Arc::clone(&self.registry);
        let context = Arc::clone(&self.context);
        let events = Arc::clone(&self.events);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let recipients = share_context(&registry, &context);
                        debug!(recipients, "Periodic context sync");
                        events.emit(OrchestrationEvent::ContextShared { recipients });
                    }
                }
            }
        });
        lock(&self.background).push(handle);
    }

    // ==================== Internals ====================

    fn ensure_ready(&self) -> Result<(), OrchestratorError> {
        if self.is_initialized() && self.consciousness().accepts_requests() {
            Ok(())
        } else {
            Err(OrchestratorError::NotInitialized)
        }
    }

    fn begin_request(&self) {
        let mut in_flight = lock(&self.in_flight);
        *in_flight += 1;
        // A concurrent transcendent request keeps the higher state
        if self.consciousness() != ConsciousnessState::Transcendent {
            self.transition(ConsciousnessState::Processing);
        }
    }

    fn end_request(&self) {
        let mut in_flight = lock(&self.in_flight);
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 && self.is_initialized() {
            self.transition(ConsciousnessState::Aware);
        }
    }

    fn transition(&self, to: ConsciousnessState) {
        let from = self.consciousness.send_replace(to);
        if from != to {
            debug!(from = %from, to = %to, "Consciousness transition");
            self.events
                .emit(OrchestrationEvent::ConsciousnessChanged { from, to });
        }
    }
}

/// Marks one `process` call as running; the engine returns to `Aware` when
/// the last one is dropped, even if the caller's future is cancelled
struct InFlight<'a> {
    owner: &'a Orchestrator,
}

impl<'a> InFlight<'a> {
    fn enter(owner: &'a Orchestrator) -> Self {
        owner.begin_request();
        Self { owner }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.owner.end_request();
    }
}

fn share_context(registry: &AgentRegistry, context: &RwLock<SharedContext>) -> usize {
    let snapshot = read(context).clone();
    registry.broadcast_to_all(&snapshot)
}

fn request_context(request: &Request) -> SharedContext {
    request
        .context
        .iter()
        .flatten()
        .map(|(key, value)| (key.clone(), Value::from(value.as_str())))
        .collect()
}

fn fusion_response(output: FusionOutput, level: &str) -> Response {
    Response::success(output.content, output.confidence)
        .with_agent_name(ORCHESTRATOR_NAME)
        .with_metadata("fusion_mode", output.mode.as_str())
        .with_metadata(PROCESSING_LEVEL_KEY, level)
        .with_metadata("contributors", output.contributions.len().to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::agent::{AgentError, ContextAware};
    use async_trait::async_trait;
    use conclave_domain::{AgentIdentity, DomainError};

    // ==================== Test Mocks ====================

    struct NamedAgent {
        name: &'static str,
        capability: &'static str,
        confidence: f32,
        context: Mutex<Option<SharedContext>>,
    }

    impl NamedAgent {
        fn new(name: &'static str, capability: &'static str, confidence: f32) -> Arc<Self> {
            Arc::new(Self {
                name,
                capability,
                confidence,
                context: Mutex::new(None),
            })
        }
    }

    impl ContextAware for NamedAgent {
        fn set_context(&self, context: &SharedContext) {
            *self.context.lock().unwrap() = Some(context.clone());
        }
    }

    #[async_trait]
    impl Agent for NamedAgent {
        fn name(&self) -> Option<String> {
            Some(self.name.to_string())
        }

        fn identity(&self) -> AgentIdentity {
            AgentIdentity::new(self.name).with_capability(self.capability)
        }

        async fn process(&self, request: &Request, _context: &str) -> Result<Response, AgentError> {
            Ok(Response::success(
                format!("{} on {}", self.name, request.query),
                self.confidence,
            ))
        }

        fn as_context_aware(&self) -> Option<&dyn ContextAware> {
            Some(self)
        }
    }

    struct SilentGenerator;

    #[async_trait]
    impl TextGenerationClient for SilentGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _temperature: Option<f32>,
            _max_tokens: Option<u32>,
        ) -> Result<Option<String>, GenerationError> {
            Ok(None)
        }
    }

    async fn ready() -> Orchestrator {
        let orchestrator = Orchestrator::new(Arc::new(SilentGenerator));
        orchestrator.register_agent("aura", NamedAgent::new("aura", capability::CREATIVE, 0.6));
        orchestrator.register_agent("kai", NamedAgent::new("kai", capability::SECURITY, 0.8));
        orchestrator.initialize().await.unwrap();
        orchestrator
    }

    #[tokio::test]
    async fn test_process_requires_initialization() {
        let orchestrator = Orchestrator::new(Arc::new(SilentGenerator));
        let result = orchestrator.process(Request::new("q", "chat")).await;
        assert!(matches!(result, Err(OrchestratorError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_initialize_without_agents_is_error_state() {
        let orchestrator = Orchestrator::new(Arc::new(SilentGenerator));
        let result = orchestrator.initialize().await;
        assert!(matches!(result, Err(OrchestratorError::NoAgents)));
        assert_eq!(orchestrator.consciousness(), ConsciousnessState::Error);
    }

    #[tokio::test]
    async fn test_simple_request_is_routed() {
        let orchestrator = ready().await;
        let response = orchestrator
            .process(Request::new("draw", "creative_art"))
            .await
            .unwrap();
        assert_eq!(response.agent_name.as_deref(), Some("aura"));
        assert_eq!(response.metadata["routing_reason"], "Optimal agent selection");
        assert_eq!(orchestrator.consciousness(), ConsciousnessState::Aware);
    }

    #[tokio::test]
    async fn test_invalid_request_becomes_error_response() {
        let orchestrator = ready().await;
        let response = orchestrator.process(Request::new("q", "  ")).await.unwrap();
        assert_eq!(response.confidence, 0.0);
        assert!(response.error.unwrap().starts_with("Invalid request: "));
    }

    #[tokio::test]
    async fn test_policy_rejection_becomes_error_response() {
        let orchestrator = Orchestrator::new(Arc::new(SilentGenerator)).with_security(
            SecurityPolicy::default()
                .with_patterns(["exploit"])
                .with_block_at(conclave_domain::ThreatLevel::Low),
        );
        orchestrator.register_agent("kai", NamedAgent::new("kai", capability::SECURITY, 0.8));
        orchestrator.initialize().await.unwrap();

        let response = orchestrator
            .process(Request::new("run the exploit", "chat"))
            .await
            .unwrap();
        assert_eq!(response.confidence, 0.0);
        let expected = DomainError::PolicyRejected(String::new()).to_string();
        assert!(response.error.unwrap().starts_with(&expected));
    }

    #[tokio::test]
    async fn test_guided_processing_synthesizes() {
        let orchestrator = ready().await;
        let response = orchestrator
            .process(Request::new("audit", "code_analysis"))
            .await
            .unwrap();
        assert_eq!(response.metadata[PROCESSING_LEVEL_KEY], "guided");
        assert_eq!(response.content, "aura: aura on audit | kai: kai on audit");
        assert!((response.confidence - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_guided_fallback_without_active_agents() {
        let orchestrator = ready().await;
        orchestrator.toggle_agent("aura");
        orchestrator.toggle_agent("kai");

        let response = orchestrator
            .process(Request::new("audit", "code_analysis"))
            .await
            .unwrap();
        assert_eq!(response.confidence, 0.5);
        assert_eq!(response.metadata[PROCESSING_LEVEL_KEY], "guided");
    }

    #[tokio::test]
    async fn test_process_query_appends_synthesis() {
        let orchestrator = ready().await;
        let messages = orchestrator.process_query("hello").await.unwrap();

        assert_eq!(messages.len(), 3);
        let last = messages.last().unwrap();
        assert_eq!(last.sender, ORCHESTRATOR_NAME);
        assert!(last.content.starts_with(SYNTHESIS_PREFIX));
        assert!((last.confidence - 0.7).abs() < 1e-6);
        assert_eq!(orchestrator.context()[LAST_QUERY_KEY], "hello");
    }

    #[tokio::test]
    async fn test_load_history_merges_last_entry() {
        let orchestrator = ready().await;
        let loaded = orchestrator
            .load_history(|| {
                Ok::<_, std::io::Error>(vec![
                    HistoryEntry::event("old"),
                    HistoryEntry::event("latest").with("mood", "curious"),
                ])
            })
            .unwrap();

        assert_eq!(loaded, 2);
        assert_eq!(orchestrator.history().len(), 2);
        assert_eq!(orchestrator.context()["mood"], "curious");
    }

    #[tokio::test]
    async fn test_share_context_reaches_aware_agents() {
        let orchestrator = Orchestrator::new(Arc::new(SilentGenerator));
        let aura = NamedAgent::new("aura", capability::CREATIVE, 0.6);
        orchestrator.register_agent("aura", aura.clone());
        orchestrator.set_context("theme", "dark");

        assert_eq!(orchestrator.share_context_with_agents(), 1);
        let seen = aura.context.lock().unwrap().clone().unwrap();
        assert_eq!(seen["theme"], "dark");
    }

    #[tokio::test]
    async fn test_register_adds_auxiliary_config() {
        let orchestrator = ready().await;
        let configs = orchestrator.agents_by_priority();
        assert_eq!(configs.len(), 2);
        assert!(configs.iter().all(|c| c.priority == AUXILIARY_PRIORITY));
    }

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerationClient for EchoGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _temperature: Option<f32>,
            _max_tokens: Option<u32>,
        ) -> Result<Option<String>, GenerationError> {
            Ok(Some(format!("rendered {} chars", prompt.len())))
        }
    }

    fn transcendent_request() -> Request {
        (0..11).fold(Request::new("everything", "vision"), |r, i| {
            r.with_context(format!("k{i}"), "v")
        })
    }

    #[tokio::test]
    async fn test_complex_request_runs_fusion() {
        let orchestrator = ready().await;
        let request = Request::new("new palette", "design").with_context("fusion_required", "yes");

        let response = orchestrator.process(request).await.unwrap();
        assert_eq!(response.metadata["fusion_mode"], "hyper_creation");
        assert_eq!(response.content, "kai on new palette");
        assert_eq!(orchestrator.fusion_state(), FusionState::Transcendent);
        assert_eq!(orchestrator.consciousness(), ConsciousnessState::Aware);
    }

    #[tokio::test]
    async fn test_transcendent_keeps_fusion_content_without_generation() {
        let orchestrator = ready().await;
        let response = orchestrator.process(transcendent_request()).await.unwrap();
        assert_eq!(response.content, "kai on everything");
        assert_eq!(response.metadata[PROCESSING_LEVEL_KEY], "transcendent");
    }

    #[tokio::test]
    async fn test_transcendent_uses_generated_text() {
        let orchestrator = Orchestrator::new(Arc::new(EchoGenerator));
        orchestrator.register_agent("kai", NamedAgent::new("kai", capability::SECURITY, 0.8));
        orchestrator.initialize().await.unwrap();

        let response = orchestrator.process(transcendent_request()).await.unwrap();
        assert!(response.content.starts_with("rendered "));
    }

    #[tokio::test]
    async fn test_history_and_status() {
        let orchestrator = ready().await;
        orchestrator.process(Request::new("hi", "chat")).await.unwrap();
        orchestrator.flush_insights().await;

        let status = orchestrator.get_system_status();
        assert!(status.initialized);
        assert_eq!(status.insight_count, 1);
        assert_eq!(status.registered_agents, vec!["aura".to_string(), "kai".to_string()]);
        // "initialized" + "process"
        assert_eq!(status.history_len, 2);

        orchestrator.clear_history();
        assert!(orchestrator.history().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_unknown_agent() {
        let orchestrator = ready().await;
        let result = orchestrator.resolve_agents(&["ghost".to_string()]);
        assert!(matches!(result, Err(OrchestratorError::UnknownAgent(name)) if name == "ghost"));
        assert_eq!(orchestrator.resolve_agents(&[]).unwrap().len(), 2);
    }

    /// Creative agent that parks on `gate` for the query "slow" and answers
    /// with an unclamped confidence
    struct GatedAgent {
        gate: tokio::sync::Notify,
        confidence: f32,
    }

    #[async_trait]
    impl Agent for GatedAgent {
        fn name(&self) -> Option<String> {
            Some("gated".to_string())
        }

        fn identity(&self) -> AgentIdentity {
            AgentIdentity::new("gated").with_capability(capability::CREATIVE)
        }

        async fn process(&self, request: &Request, _context: &str) -> Result<Response, AgentError> {
            if request.query == "slow" {
                self.gate.notified().await;
            }
            Ok(Response {
                confidence: self.confidence,
                ..Response::success(request.query.clone(), 0.5)
            })
        }
    }

    async fn gated(confidence: f32) -> (Orchestrator, Arc<GatedAgent>) {
        let agent = Arc::new(GatedAgent {
            gate: tokio::sync::Notify::new(),
            confidence,
        });
        let orchestrator = Orchestrator::new(Arc::new(SilentGenerator));
        orchestrator.register_agent("gated", agent.clone());
        orchestrator.initialize().await.unwrap();
        (orchestrator, agent)
    }

    #[tokio::test]
    async fn test_routed_response_confidence_is_clamped() {
        let (orchestrator, _) = gated(1.7).await;
        let response = orchestrator
            .process(Request::new("draw", "creative_art"))
            .await
            .unwrap();
        assert_eq!(response.confidence, 1.0);

        let (orchestrator, _) = gated(f32::NAN).await;
        let response = orchestrator.process(Request::new("q", "chat")).await.unwrap();
        assert_eq!(response.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_stays_processing_while_another_request_runs() {
        let (orchestrator, agent) = gated(0.5).await;

        let slow = orchestrator.process(Request::new("slow", "creative_art"));
        let fast = async {
            let response = orchestrator
                .process(Request::new("fast", "creative_art"))
                .await
                .unwrap();
            assert_eq!(response.content, "fast");
            assert_eq!(orchestrator.consciousness(), ConsciousnessState::Processing);
            agent.gate.notify_one();
        };

        let (slow, ()) = tokio::join!(slow, fast);
        assert_eq!(slow.unwrap().content, "slow");
        assert_eq!(orchestrator.consciousness(), ConsciousnessState::Aware);
    }

    #[tokio::test]
    async fn test_shutdown_returns_to_dormant() {
        let orchestrator = ready().await;
        orchestrator.shutdown().await;
        assert_eq!(orchestrator.consciousness(), ConsciousnessState::Dormant);
        assert!(!orchestrator.is_initialized());
        assert!(matches!(
            orchestrator.process(Request::new("q", "chat")).await,
            Err(OrchestratorError::NotInitialized)
        ));
    }
}
