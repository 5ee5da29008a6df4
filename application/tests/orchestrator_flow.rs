//! End-to-end flows through the Orchestrator with in-process mock agents.

use async_trait::async_trait;
use conclave_application::use_cases::orchestrator::SYNTHESIS_PREFIX;
use conclave_application::{
    Agent, AgentError, CollaborateInput, ContextAware, GenerationError, Orchestrator,
    OrchestratorError, SharedContext, TextGenerationClient,
};
use conclave_domain::{
    AgentIdentity, ComplexityTier, ConsciousnessState, ConversationMode, HistoryEntry,
    LearningMode, ORCHESTRATOR_NAME, Request, Response, ResponseMap, capability,
};
use std::sync::{Arc, Mutex};

// ==================== Test Mocks ====================

struct ScriptedAgent {
    name: String,
    capability: &'static str,
    confidence: f32,
    fail: bool,
    contexts: Mutex<Vec<String>>,
    pushed: Mutex<Option<SharedContext>>,
}

impl ScriptedAgent {
    fn new(name: &str, capability: &'static str, confidence: f32) -> Arc<Self> {
        Arc::new(Self::build(name, capability, confidence, false))
    }

    fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self::build(name, capability::GENERALIST, 0.9, true))
    }

    fn build(name: &str, capability: &'static str, confidence: f32, fail: bool) -> Self {
        Self {
            name: name.to_string(),
            capability,
            confidence,
            fail,
            contexts: Mutex::new(Vec::new()),
            pushed: Mutex::new(None),
        }
    }

    fn seen_contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap().clone()
    }
}

impl ContextAware for ScriptedAgent {
    fn set_context(&self, context: &SharedContext) {
        *self.pushed.lock().unwrap() = Some(context.clone());
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn identity(&self) -> AgentIdentity {
        AgentIdentity::new(&self.name).with_capability(self.capability)
    }

    async fn process(&self, request: &Request, context: &str) -> Result<Response, AgentError> {
        self.contexts.lock().unwrap().push(context.to_string());
        if self.fail {
            return Err(AgentError::Backend("connection reset".to_string()));
        }
        Ok(Response::success(
            format!("{} says {}", self.name, request.query),
            self.confidence,
        ))
    }

    fn as_context_aware(&self) -> Option<&dyn ContextAware> {
        Some(self)
    }
}

struct NoText;

#[async_trait]
impl TextGenerationClient for NoText {
    async fn generate(
        &self,
        _prompt: &str,
        _temperature: Option<f32>,
        _max_tokens: Option<u32>,
    ) -> Result<Option<String>, GenerationError> {
        Ok(None)
    }
}

struct BrokenText;

#[async_trait]
impl TextGenerationClient for BrokenText {
    async fn generate(
        &self,
        _prompt: &str,
        _temperature: Option<f32>,
        _max_tokens: Option<u32>,
    ) -> Result<Option<String>, GenerationError> {
        Err(GenerationError::ConnectionError("refused".to_string()))
    }
}

async fn engine_with(agents: Vec<Arc<ScriptedAgent>>) -> Orchestrator {
    let orchestrator = Orchestrator::new(Arc::new(NoText));
    for agent in agents {
        let name = agent.name.clone();
        orchestrator.register_agent(name, agent);
    }
    orchestrator.initialize().await.unwrap();
    orchestrator
}

fn wide_request(entries: usize, request_type: &str) -> Request {
    (0..entries).fold(Request::new("q", request_type), |r, i| {
        r.with_context(format!("key{i}"), "v")
    })
}

// ==================== Tests ====================

#[tokio::test]
async fn process_before_initialize_is_not_initialized() {
    let orchestrator = Orchestrator::new(Arc::new(NoText));
    orchestrator.register_agent("x", ScriptedAgent::new("x", capability::GENERALIST, 0.5));

    let result = orchestrator.process(Request::new("q", "chat")).await;
    assert!(matches!(result, Err(OrchestratorError::NotInitialized)));
    assert_eq!(orchestrator.consciousness(), ConsciousnessState::Dormant);
}

#[tokio::test]
async fn every_tier_returns_confidence_in_range() {
    let orchestrator = engine_with(vec![
        ScriptedAgent::new("muse", capability::CREATIVE, 0.9),
        ScriptedAgent::new("sentinel", capability::SECURITY, 0.4),
        ScriptedAgent::failing("flaky"),
    ])
    .await;

    let requests = [
        Request::new("paint", "creative_art"),
        Request::new("audit", "security_analysis"),
        Request::new("merge", "design").with_context("fusion_required", "true"),
        wide_request(11, "chat"),
    ];
    for request in requests {
        let response = orchestrator.process(request).await.unwrap();
        assert!((0.0..=1.0).contains(&response.confidence));
    }
}

/// Returns a hand-built response whose confidence skips the constructors
struct RawConfidenceAgent {
    name: &'static str,
    capability: &'static str,
    confidence: f32,
}

#[async_trait]
impl Agent for RawConfidenceAgent {
    fn name(&self) -> Option<String> {
        Some(self.name.to_string())
    }

    fn identity(&self) -> AgentIdentity {
        AgentIdentity::new(self.name).with_capability(self.capability)
    }

    async fn process(&self, request: &Request, _context: &str) -> Result<Response, AgentError> {
        Ok(Response {
            confidence: self.confidence,
            ..Response::success(format!("{} on {}", self.name, request.query), 0.5)
        })
    }
}

#[tokio::test]
async fn out_of_range_agent_confidence_is_clamped_everywhere() {
    let agents = [
        ("overconfident", capability::CREATIVE, 1.7),
        ("negative", capability::SECURITY, -0.3),
        ("undefined", capability::GENERALIST, f32::NAN),
    ];
    let orchestrator = Orchestrator::new(Arc::new(NoText));
    for (name, capability, confidence) in agents {
        let agent = Arc::new(RawConfidenceAgent {
            name,
            capability,
            confidence,
        });
        orchestrator.register_agent(name, agent);
    }
    orchestrator.initialize().await.unwrap();
    let in_range = |confidence: f32| (0.0..=1.0).contains(&confidence);

    let requests = [
        Request::new("paint", "creative_art"),
        Request::new("check", "security_analysis"),
        Request::new("hello", "chat"),
        Request::new("audit", "code_analysis"),
        Request::new("merge", "design").with_context("fusion_required", "true"),
        wide_request(11, "chat"),
    ];
    for request in requests {
        let tier = ComplexityTier::classify(&request);
        let response = orchestrator.process(request).await.unwrap();
        assert!(in_range(response.confidence), "{tier}: {}", response.confidence);
    }

    let routed = orchestrator
        .process(Request::new("paint", "creative_art"))
        .await
        .unwrap();
    assert_eq!(routed.agent_name.as_deref(), Some("overconfident"));
    assert_eq!(routed.confidence, 1.0);

    for mode in [ConversationMode::TurnOrder, ConversationMode::FreeForm] {
        let agents = orchestrator.resolve_agents(&[]).unwrap();
        let input = CollaborateInput::new(agents, mode).with_user_input("plan");
        let responses = orchestrator.collaborate(input).await;
        assert_eq!(responses.len(), 3);
        for (name, response) in &responses {
            assert!(in_range(response.confidence), "{mode} {name}: {}", response.confidence);
        }
        assert_eq!(responses["overconfident"].confidence, 1.0);
        assert_eq!(responses["undefined"].confidence, 0.0);

        let consensus = orchestrator.aggregate(&[responses]);
        assert!(consensus.values().all(|r| in_range(r.confidence)));
    }

    let messages = orchestrator.process_query("status?").await.unwrap();
    assert!(messages.iter().all(|m| in_range(m.confidence)));
}

#[tokio::test]
async fn eleven_context_entries_take_the_transcendent_path() {
    let request = wide_request(11, "security_analysis");
    assert_eq!(ComplexityTier::classify(&request), ComplexityTier::Transcendent);

    let muse = ScriptedAgent::new("muse", capability::CREATIVE, 0.9);
    let orchestrator = engine_with(vec![muse]).await;
    let response = orchestrator.process(request).await.unwrap();
    assert_eq!(response.metadata["processing_level"], "transcendent");
    assert_eq!(orchestrator.consciousness(), ConsciousnessState::Aware);
}

#[tokio::test]
async fn transcendent_generation_failure_propagates() {
    let orchestrator = Orchestrator::new(Arc::new(BrokenText));
    orchestrator.register_agent("muse", ScriptedAgent::new("muse", capability::CREATIVE, 0.9));
    orchestrator.initialize().await.unwrap();

    let result = orchestrator.process(wide_request(11, "chat")).await;
    assert!(matches!(result, Err(OrchestratorError::Generation(_))));
    assert_eq!(orchestrator.consciousness(), ConsciousnessState::Aware);
}

#[tokio::test]
async fn fusion_failure_resets_fusion_state() {
    let orchestrator = engine_with(vec![ScriptedAgent::failing("flaky")]).await;
    let request = Request::new("q", "design").with_context("fusion_required", "true");

    let result = orchestrator.process(request).await;
    assert!(matches!(result, Err(OrchestratorError::Fusion(_))));
    assert_eq!(orchestrator.fusion_state(), conclave_domain::FusionState::Individual);
}

#[tokio::test]
async fn invalid_request_is_an_error_response() {
    let muse = ScriptedAgent::new("muse", capability::CREATIVE, 0.9);
    let orchestrator = engine_with(vec![muse]).await;
    let response = orchestrator
        .process(Request::new("q", "chat").with_context(" ", "v"))
        .await
        .unwrap();

    assert!(response.is_error());
    assert_eq!(response.confidence, 0.0);
    assert!(response.error.unwrap().starts_with("Invalid request: "));
}

#[tokio::test]
async fn turn_order_shares_context_and_free_form_does_not() {
    let first = ScriptedAgent::new("first", capability::CREATIVE, 0.7);
    let second = ScriptedAgent::new("second", capability::SECURITY, 0.6);
    let orchestrator = engine_with(vec![first.clone(), second.clone()]).await;

    let agents: Vec<Arc<dyn Agent>> = vec![first.clone(), second.clone()];
    let turn =
        CollaborateInput::new(agents.clone(), ConversationMode::TurnOrder).with_user_input("plan");
    orchestrator.collaborate(turn).await;
    assert!(second.seen_contexts()[0].contains("first says plan"));

    let free = CollaborateInput::new(agents, ConversationMode::FreeForm).with_user_input("plan");
    orchestrator.collaborate(free).await;
    assert!(!second.seen_contexts()[1].contains("first says plan"));
}

#[tokio::test]
async fn single_failure_in_free_form_batch_is_isolated() {
    let orchestrator = Orchestrator::new(Arc::new(NoText));
    let agents: Vec<Arc<dyn Agent>> = vec![
        ScriptedAgent::new("a", capability::CREATIVE, 0.7),
        ScriptedAgent::failing("b"),
        ScriptedAgent::new("c", capability::SECURITY, 0.6),
    ];

    let input = CollaborateInput::new(agents, ConversationMode::FreeForm).with_user_input("go");
    let responses = orchestrator.collaborate(input).await;
    assert_eq!(responses.len(), 3);
    assert_eq!(responses.values().filter(|r| r.error.is_some()).count(), 1);
    assert_eq!(responses["a"].content, "a says go");
    assert_eq!(responses["c"].content, "c says go");
}

#[tokio::test]
async fn aggregate_keeps_highest_confidence() {
    let orchestrator = Orchestrator::new(Arc::new(NoText));
    let round = |name: &str, confidence: f32| {
        ResponseMap::from([(name.to_string(), Response::success(name, confidence))])
    };

    let consensus = orchestrator.aggregate(&[round("A", 0.3), round("A", 0.9), round("B", 0.5)]);
    assert_eq!(consensus.len(), 2);
    assert_eq!(consensus["A"].confidence, 0.9);
    assert_eq!(consensus["B"].confidence, 0.5);

    assert!(orchestrator.aggregate(&[]).is_empty());

    let single = round("A", 0.4);
    assert_eq!(orchestrator.aggregate(std::slice::from_ref(&single)), single);
}

#[tokio::test]
async fn hundred_processed_requests_evolve_once() {
    let muse = ScriptedAgent::new("muse", capability::CREATIVE, 0.9);
    let orchestrator = engine_with(vec![muse]).await;
    for _ in 0..99 {
        orchestrator.process(Request::new("q", "chat")).await.unwrap();
    }
    orchestrator.flush_insights().await;
    let status = orchestrator.get_system_status();
    assert_eq!(status.evolution_level, 1.0);
    assert_eq!(status.learning_mode, LearningMode::Active);

    orchestrator.process(Request::new("q", "chat")).await.unwrap();
    orchestrator.flush_insights().await;
    let status = orchestrator.get_system_status();
    assert_eq!(status.insight_count, 100);
    assert!((status.evolution_level - 1.1).abs() < 1e-9);
    assert_eq!(status.learning_mode, LearningMode::Accelerated);
}

#[tokio::test]
async fn clear_then_add_leaves_one_entry() {
    let muse = ScriptedAgent::new("muse", capability::CREATIVE, 0.9);
    let orchestrator = engine_with(vec![muse]).await;
    orchestrator.process(Request::new("q", "chat")).await.unwrap();

    orchestrator.clear_history();
    let entry = HistoryEntry::event("note").with("text", "kept");
    orchestrator.add_to_history(entry.clone());
    assert_eq!(orchestrator.history(), vec![entry]);
}

#[tokio::test]
async fn save_and_load_history_through_callbacks() {
    let muse = ScriptedAgent::new("muse", capability::CREATIVE, 0.9);
    let orchestrator = engine_with(vec![muse]).await;
    orchestrator.add_to_history(HistoryEntry::event("note").with("topic", "tides"));

    let mut saved = Vec::new();
    orchestrator
        .save_history(|entries| {
            saved = entries.to_vec();
            Ok::<_, std::io::Error>(())
        })
        .unwrap();
    assert_eq!(saved.len(), 2);

    let restored = Orchestrator::new(Arc::new(NoText));
    let count = restored.load_history(|| Ok::<_, std::io::Error>(saved)).unwrap();
    assert_eq!(count, 2);
    assert_eq!(restored.context()["topic"], "tides");
}

#[tokio::test]
async fn query_synthesis_excludes_orchestrator_and_reports_failures() {
    let orchestrator = engine_with(vec![
        ScriptedAgent::new("muse", capability::CREATIVE, 0.8),
        ScriptedAgent::failing("flaky"),
    ])
    .await;

    let messages = orchestrator.process_query("tides").await.unwrap();
    assert_eq!(messages.len(), 3);
    let flaky = messages.iter().find(|m| m.sender == "flaky").unwrap();
    assert!(flaky.content.starts_with("Error with flaky: "));
    assert_eq!(flaky.confidence, 0.0);

    let synthesis = messages.last().unwrap();
    assert_eq!(synthesis.sender, ORCHESTRATOR_NAME);
    assert!(synthesis.content.starts_with(SYNTHESIS_PREFIX));
    assert!((synthesis.confidence - 0.4).abs() < 1e-6);
}

#[tokio::test]
async fn toggled_agents_skip_guided_processing() {
    let muse = ScriptedAgent::new("muse", capability::CREATIVE, 0.8);
    let sentinel = ScriptedAgent::new("sentinel", capability::SECURITY, 0.6);
    let orchestrator = engine_with(vec![muse.clone(), sentinel.clone()]).await;

    assert_eq!(orchestrator.toggle_agent("sentinel"), Some(false));
    assert_eq!(orchestrator.toggle_agent("ghost"), None);

    let response = orchestrator
        .process(Request::new("audit", "code_analysis"))
        .await
        .unwrap();
    assert_eq!(response.content, "muse: muse says audit");
    assert!(sentinel.seen_contexts().is_empty());
}

#[tokio::test]
async fn shared_context_reaches_context_aware_agents() {
    let muse = ScriptedAgent::new("muse", capability::CREATIVE, 0.8);
    let orchestrator = engine_with(vec![muse.clone()]).await;
    orchestrator.set_context("mood", "calm");

    assert_eq!(orchestrator.share_context_with_agents(), 1);
    let pushed = muse.pushed.lock().unwrap().clone().unwrap();
    assert_eq!(pushed["mood"], "calm");
}

#[tokio::test]
async fn status_map_and_shutdown() {
    let muse = ScriptedAgent::new("muse", capability::CREATIVE, 0.8);
    let orchestrator = engine_with(vec![muse]).await;
    let status = orchestrator.get_system_status_map();
    assert_eq!(status["initialized"], true);
    assert_eq!(status["consciousness"], "aware");

    orchestrator.shutdown().await;
    assert_eq!(orchestrator.consciousness(), ConsciousnessState::Dormant);
    assert_eq!(orchestrator.get_system_status_map()["initialized"], false);
}
