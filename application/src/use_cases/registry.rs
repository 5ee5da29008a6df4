//! Agent registry
//!
//! Named map of agents plus the set of currently active names. Both live
//! behind `std` locks that are never held across an `.await`.

use crate::ports::agent::{Agent, SharedContext, broadcast_context};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Shared, mutable map of named agents
#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<BTreeMap<String, Arc<dyn Agent>>>,
    active: RwLock<BTreeSet<String>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an agent under `name` and mark it active.
    ///
    /// Returns the agent previously registered under that name.
    pub fn register(
        &self,
        name: impl Into<String>,
        agent: Arc<dyn Agent>,
    ) -> Option<Arc<dyn Agent>> {
        let name = name.into();
        debug!(agent = %name, "Registering agent");
        let previous = self
            .agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), agent);
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name);
        previous
    }

    /// Remove an agent; it also leaves the active set
    pub fn deregister(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        self.agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Active names, sorted
    pub fn active_names(&self) -> Vec<String> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    /// Flip an agent's membership in the active set.
    ///
    /// Returns the new state, or `None` if no agent is registered under `name`.
    pub fn toggle(&self, name: &str) -> Option<bool> {
        if !self.contains(name) {
            return None;
        }
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if active.remove(name) {
            Some(false)
        } else {
            active.insert(name.to_string());
            Some(true)
        }
    }

    /// All registered agents in name order
    pub fn all(&self) -> Vec<(String, Arc<dyn Agent>)> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, agent)| (name.clone(), Arc::clone(agent)))
            .collect()
    }

    /// Active agents in name order
    pub fn active_agents(&self) -> Vec<(String, Arc<dyn Agent>)> {
        let all = self.all();
        let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
        all.into_iter()
            .filter(|(name, _)| active.contains(name))
            .collect()
    }

    /// First registered agent (in name order) advertising `capability`
    pub fn find_by_capability(&self, capability: &str) -> Option<(String, Arc<dyn Agent>)> {
        self.all()
            .into_iter()
            .find(|(_, agent)| agent.identity().has_capability(capability))
    }

    /// Push `context` to every registered context-aware agent
    pub fn broadcast_to_all(&self, context: &SharedContext) -> usize {
        let targets: Vec<Arc<dyn Agent>> = self.all().into_iter().map(|(_, agent)| agent).collect();
        broadcast_context(context, &targets)
    }

    pub fn len(&self) -> usize {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::agent::{AgentError, ContextAware};
    use async_trait::async_trait;
    use conclave_domain::{AgentIdentity, Request, Response, capability};
    use std::sync::Mutex;

    struct StubAgent {
        name: String,
        capability: &'static str,
        seen: Mutex<Vec<SharedContext>>,
        aware: bool,
    }

    impl StubAgent {
        fn new(name: &str, capability: &'static str) -> Self {
            Self {
                name: name.to_string(),
                capability,
                seen: Mutex::new(Vec::new()),
                aware: false,
            }
        }

        fn context_aware(mut self) -> Self {
            self.aware = true;
            self
        }
    }

    impl ContextAware for StubAgent {
        fn set_context(&self, context: &SharedContext) {
            self.seen.lock().unwrap().push(context.clone());
        }
    }

    #[async_trait]
    impl Agent for StubAgent {
        fn name(&self) -> Option<String> {
            Some(self.name.clone())
        }

        fn identity(&self) -> AgentIdentity {
            AgentIdentity::new(&self.name).with_capability(self.capability)
        }

        async fn process(
            &self,
            _request: &Request,
            _context: &str,
        ) -> Result<Response, AgentError> {
            Ok(Response::success(&self.name, 0.5))
        }

        fn as_context_aware(&self) -> Option<&dyn ContextAware> {
            self.aware.then_some(self as &dyn ContextAware)
        }
    }

    #[test]
    fn test_register_overwrites() {
        let registry = AgentRegistry::new();
        let first = Arc::new(StubAgent::new("aura", capability::CREATIVE));
        assert!(registry.register("aura", first).is_none());
        let second = Arc::new(StubAgent::new("aura-2", capability::CREATIVE));
        let previous = registry.register("aura", second);

        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("aura").and_then(|a| a.name()), Some("aura-2".to_string()));
    }

    #[test]
    fn test_deregister_removes_from_active() {
        let registry = AgentRegistry::new();
        registry.register("kai", Arc::new(StubAgent::new("kai", capability::SECURITY)));
        assert!(registry.is_active("kai"));

        assert!(registry.deregister("kai").is_some());
        assert!(registry.get("kai").is_none());
        assert!(!registry.is_active("kai"));
        assert!(registry.deregister("kai").is_none());
    }

    #[test]
    fn test_toggle() {
        let registry = AgentRegistry::new();
        registry.register("kai", Arc::new(StubAgent::new("kai", capability::SECURITY)));

        assert_eq!(registry.toggle("kai"), Some(false));
        assert!(registry.active_agents().is_empty());
        assert_eq!(registry.toggle("kai"), Some(true));
        assert_eq!(registry.active_names(), vec!["kai".to_string()]);
        assert_eq!(registry.toggle("ghost"), None);
    }

    #[test]
    fn test_find_by_capability() {
        let registry = AgentRegistry::new();
        registry.register("genesis", Arc::new(StubAgent::new("genesis", capability::GENERALIST)));
        registry.register("kai", Arc::new(StubAgent::new("kai", capability::SECURITY)));

        let (name, _) = registry.find_by_capability(capability::SECURITY).unwrap();
        assert_eq!(name, "kai");
        assert!(registry.find_by_capability(capability::CREATIVE).is_none());
    }

    #[test]
    fn test_broadcast_only_reaches_context_aware() {
        let registry = AgentRegistry::new();
        let aware = Arc::new(StubAgent::new("aura", capability::CREATIVE).context_aware());
        let plain = Arc::new(StubAgent::new("kai", capability::SECURITY));
        registry.register("aura", aware.clone());
        registry.register("kai", plain.clone());

        let mut context = SharedContext::new();
        context.insert("last_query".to_string(), "hello".into());

        assert_eq!(registry.broadcast_to_all(&context), 1);
        assert_eq!(aware.seen.lock().unwrap().len(), 1);
        assert!(plain.seen.lock().unwrap().is_empty());
    }
}
