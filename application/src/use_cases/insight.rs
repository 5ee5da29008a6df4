//! Insight recording actor
//!
//! Recording an insight is fire-and-forget: callers push a message onto an
//! unbounded channel and a single background task applies it to the
//! [`EvolutionTracker`]. The tracker is published through a `watch` channel
//! so readers always see the last committed snapshot.
//!
//! Because the task is the only consumer, increments are applied one at a
//! time and the evolution check always sees the post-increment count.

use crate::ports::event_bus::{EventBus, OrchestrationEvent};
use conclave_domain::{ComplexityTier, EvolutionTracker};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

enum InsightCommand {
    Record { tier: ComplexityTier, success: bool },
    Flush(oneshot::Sender<()>),
}

/// Handle to the insight actor
pub struct InsightTracker {
    commands: Mutex<mpsc::UnboundedSender<InsightCommand>>,
    state: Arc<watch::Sender<EvolutionTracker>>,
    task: Mutex<Option<JoinHandle<()>>>,
    events: Arc<dyn EventBus>,
}

impl InsightTracker {
    /// Create a stopped tracker; call [`InsightTracker::start`] to spawn the actor
    pub fn new(events: Arc<dyn EventBus>) -> Self {
        // Receiver dropped: records sent before `start` are discarded
        let (commands, _) = mpsc::unbounded_channel();
        Self {
            commands: Mutex::new(commands),
            state: Arc::new(watch::channel(EvolutionTracker::new()).0),
            task: Mutex::new(None),
            events,
        }
    }

    /// Spawn the actor task. A running actor is left alone.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, cancel: CancellationToken) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self.commands.lock().unwrap_or_else(PoisonError::into_inner) = tx;

        let state = Arc::clone(&self.state);
        let events = Arc::clone(&self.events);
        *task = Some(tokio::spawn(run_actor(rx, state, events, cancel)));
    }

    /// Wait for the actor to exit after its cancellation token fired
    pub async fn join(&self) {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Queue one insight; never blocks
    pub fn record(&self, tier: ComplexityTier, success: bool) {
        let sent = self
            .commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(InsightCommand::Record { tier, success });
        if sent.is_err() {
            debug!("Insight dropped: actor not running");
        }
    }

    /// Resolve once every insight queued before this call has been applied
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        let sent = self
            .commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(InsightCommand::Flush(ack));
        if sent.is_ok() {
            let _ = done.await;
        }
    }

    /// Raise the learning mode to at least `Active`
    pub fn awaken(&self) {
        self.state.send_modify(EvolutionTracker::awaken);
    }

    pub fn snapshot(&self) -> EvolutionTracker {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EvolutionTracker> {
        self.state.subscribe()
    }
}

async fn run_actor(
    mut commands: mpsc::UnboundedReceiver<InsightCommand>,
    state: Arc<watch::Sender<EvolutionTracker>>,
    events: Arc<dyn EventBus>,
    cancel: CancellationToken,
) {
    debug!("Insight actor started");
    loop {
        let command = tokio::select! {
            _ = cancel.cancelled() => break,
            command = commands.recv() => command,
        };
        match command {
            Some(InsightCommand::Record { tier, success }) => {
                let mut evolution = None;
                let mut count = 0;
                state.send_modify(|tracker| {
                    evolution = tracker.record_insight();
                    count = tracker.insight_count();
                });
                debug!(tier = %tier, success, insight_count = count, "Insight recorded");
                events.emit(OrchestrationEvent::InsightRecorded {
                    insight_count: count,
                    tier,
                });
                if let Some(event) = evolution {
                    info!(
                        level = event.evolution_level,
                        insight_count = event.insight_count,
                        "Evolution triggered"
                    );
                    events.emit(OrchestrationEvent::Evolved {
                        insight_count: event.insight_count,
                        evolution_level: event.evolution_level,
                        learning_mode: event.learning_mode,
                    });
                }
            }
            Some(InsightCommand::Flush(ack)) => {
                let _ = ack.send(());
            }
            None => break,
        }
    }
    debug!("Insight actor stopped");
}
