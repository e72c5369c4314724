//! Engine composition root
//!
//! [`CallEngine`] wires the store, router, and timer registry together and
//! owns the broadcast channel consumers subscribe to. The platform layer
//! builds one engine at startup, feeds it [`CallEvent`]s from its adapters,
//! and renders whatever [`EngineEvent`]s come back.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::error::CallCoreResult;
use crate::events::{CallEvent, EngineEvent};
use crate::policy::ForegroundContext;
use crate::router::{CallEventRouter, ForegroundProbe, NullForegroundProbe};
use crate::store::{CallSnapshot, CallStateListener, CallStateStore};
use crate::timers::CallTimers;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Bridges store mutations onto the engine's broadcast channel.
struct SnapshotPublisher {
    events_tx: broadcast::Sender<EngineEvent>,
}

#[async_trait::async_trait]
impl CallStateListener for SnapshotPublisher {
    async fn on_call_state_changed(&self, snapshot: CallSnapshot) {
        let _ = self.events_tx.send(EngineEvent::StateChanged(snapshot));
    }
}

/// Builder for a [`CallEngine`].
///
/// # Examples
///
/// ```rust
/// use ringside_call_core::engine::CallEngine;
///
/// # tokio_test::block_on(async {
/// let engine = CallEngine::builder().build().await;
/// let mut events = engine.subscribe();
/// # drop(events);
/// # });
/// ```
pub struct CallEngineBuilder {
    probe: Option<Arc<dyn ForegroundProbe>>,
    channel_capacity: usize,
}

impl CallEngineBuilder {
    /// Supply the platform's foreground-app probe. Without one, placement
    /// always falls back to native UI.
    pub fn with_foreground_probe(mut self, probe: Arc<dyn ForegroundProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Capacity of the engine's broadcast channel.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Wire everything up.
    pub async fn build(self) -> CallEngine {
        let (events_tx, _) = broadcast::channel(self.channel_capacity);
        let store = Arc::new(CallStateStore::new());
        store
            .add_listener(Arc::new(SnapshotPublisher {
                events_tx: events_tx.clone(),
            }))
            .await;

        let probe = self
            .probe
            .unwrap_or_else(|| Arc::new(NullForegroundProbe));
        let router = Arc::new(CallEventRouter::new(
            store.clone(),
            probe,
            events_tx.clone(),
        ));

        info!("call engine initialized");
        CallEngine {
            store,
            router,
            timers: Arc::new(CallTimers::new()),
            events_tx,
        }
    }
}

/// The reconciliation engine: one per process.
pub struct CallEngine {
    store: Arc<CallStateStore>,
    router: Arc<CallEventRouter>,
    timers: Arc<CallTimers>,
    events_tx: broadcast::Sender<EngineEvent>,
}

impl CallEngine {
    /// Start building an engine.
    pub fn builder() -> CallEngineBuilder {
        CallEngineBuilder {
            probe: None,
            channel_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }

    /// Feed one ingestion event through the router.
    pub async fn ingest(&self, event: CallEvent) -> CallCoreResult<()> {
        self.router.ingest(event).await
    }

    /// Subscribe to engine output events.
    ///
    /// Each subscriber gets every event published after the call; a slow
    /// subscriber that lags past the channel capacity loses the oldest
    /// events, per broadcast-channel semantics.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events_tx.subscribe()
    }

    /// Atomic view of the authoritative call state.
    pub async fn snapshot(&self) -> CallSnapshot {
        self.store.snapshot().await
    }

    /// The authoritative store, for adapters that need slot queries.
    pub fn store(&self) -> &Arc<CallStateStore> {
        &self.store
    }

    /// The engine's timer registry.
    pub fn timers(&self) -> &Arc<CallTimers> {
        &self.timers
    }

    /// Current foreground context as the placement policy would see it.
    pub async fn foreground_context(&self) -> ForegroundContext {
        self.router.foreground_context().await
    }

    /// Tear down: cancel timers and clear the store.
    pub async fn shutdown(&self) {
        self.timers.cancel_all();
        self.store.reset().await;
        info!("call engine shut down");
    }
}
