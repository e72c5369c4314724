//! Authoritative call state store
//!
//! Single-writer state machine for "what call situation is the device in
//! right now". All transitions funnel through this store; every other
//! component reads its snapshot. The store owns the only references to the
//! current and waiting call handles - adapters must never keep their own
//! copies that can drift out of sync.
//!
//! # State machine
//!
//! ```text
//! Idle --incoming--> Incoming --answered--> Active --hold--> Hold
//!                        |                     |                |
//!                        | terminated          | new incoming   | unhold
//!                        v                     v                v
//!                      Idle               CallWaiting -------> Active
//! ```
//!
//! The waiting slot is independent of the current slot: a waiting call that
//! is declined or rings out returns the state to `Active` and must never be
//! mistaken for the current call ending. When the *current* call ends while
//! a waiting call is pending, the waiting call is promoted to current.
//!
//! # Concurrency
//!
//! One `tokio::sync::Mutex` serializes every mutation; a logical mutation
//! (state update + listener fan-out) completes before the next begins.
//! Snapshot reads take the same lock and are therefore atomic relative to
//! mutations. A panicking listener is isolated and logged; the remaining
//! listeners still run.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::call::{CallHandle, CallHandleId, CallState};
use crate::error::{CallCoreError, CallCoreResult};

/// Atomic view of the store: state plus both slot numbers.
///
/// Handed to every listener on every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSnapshot {
    /// Authoritative call state.
    pub state: CallState,
    /// Number of the current call, if one is tracked.
    pub current_number: Option<String>,
    /// Number of the waiting call; set only while state is `CallWaiting`.
    pub waiting_number: Option<String>,
}

impl CallSnapshot {
    fn idle() -> Self {
        Self {
            state: CallState::Idle,
            current_number: None,
            waiting_number: None,
        }
    }
}

/// Observer of store mutations.
///
/// Invoked synchronously inside each mutation, after the state has been
/// updated. Implementations that need to touch UI should hand the snapshot
/// off to their own queue rather than block here.
#[async_trait::async_trait]
pub trait CallStateListener: Send + Sync {
    async fn on_call_state_changed(&self, snapshot: CallSnapshot);
}

/// The two handle slots plus the authoritative state.
struct Slots {
    state: CallState,
    current: Option<CallHandle>,
    current_number: Option<String>,
    waiting: Option<CallHandle>,
    waiting_number: Option<String>,
}

impl Slots {
    fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            state: self.state,
            current_number: self.current_number.clone(),
            waiting_number: self.waiting_number.clone(),
        }
    }

    fn clear_waiting(&mut self) {
        self.waiting = None;
        self.waiting_number = None;
    }

    fn promote_waiting(&mut self) {
        self.current = self.waiting.take();
        self.current_number = self.waiting_number.take();
    }
}

/// Single authoritative mutator of [`CallState`].
///
/// Explicitly constructed by the composition root and shared as
/// `Arc<CallStateStore>`; there is deliberately no global instance.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use ringside_call_core::store::CallStateStore;
/// use ringside_call_core::call::CallState;
///
/// # tokio_test::block_on(async {
/// let store = Arc::new(CallStateStore::new());
/// assert_eq!(store.snapshot().await.state, CallState::Idle);
/// # });
/// ```
pub struct CallStateStore {
    slots: Mutex<Slots>,
    listeners: RwLock<Vec<Arc<dyn CallStateListener>>>,
}

impl CallStateStore {
    /// Create an idle store with no listeners.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                state: CallState::Idle,
                current: None,
                current_number: None,
                waiting: None,
                waiting_number: None,
            }),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a state-change observer.
    pub async fn add_listener(&self, listener: Arc<dyn CallStateListener>) {
        let mut listeners = self.listeners.write().await;
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Remove a previously registered observer.
    pub async fn remove_listener(&self, listener: &Arc<dyn CallStateListener>) {
        self.listeners
            .write()
            .await
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Atomic view of state plus both numbers.
    pub async fn snapshot(&self) -> CallSnapshot {
        self.slots.lock().await.snapshot()
    }

    /// Current call handle, if one is tracked.
    pub async fn current_call(&self) -> Option<CallHandle> {
        self.slots.lock().await.current.clone()
    }

    /// Waiting call handle, non-`None` only while state is `CallWaiting`.
    pub async fn waiting_call(&self) -> Option<CallHandle> {
        self.slots.lock().await.waiting.clone()
    }

    /// Whether `id` identifies the handle in the waiting slot.
    ///
    /// Adapters call this before running any termination side effect; the
    /// waiting branch must short-circuit before current-slot bookkeeping.
    pub async fn is_waiting_handle(&self, id: CallHandleId) -> bool {
        self.slots
            .lock()
            .await
            .waiting
            .as_ref()
            .map(|w| w.id() == id)
            .unwrap_or(false)
    }

    /// Whether `id` identifies the handle in the current slot.
    pub async fn is_current_handle(&self, id: CallHandleId) -> bool {
        self.slots
            .lock()
            .await
            .current
            .as_ref()
            .map(|c| c.id() == id)
            .unwrap_or(false)
    }

    /// Whether a call is up (active or held).
    pub async fn has_active_call(&self) -> bool {
        matches!(
            self.slots.lock().await.state,
            CallState::Active | CallState::Hold | CallState::CallWaiting
        )
    }

    /// Whether a second call is pending behind the current one.
    pub async fn is_call_waiting(&self) -> bool {
        self.slots.lock().await.state == CallState::CallWaiting
    }

    /// Whether an incoming call is ringing with no other call up.
    pub async fn has_incoming_call(&self) -> bool {
        self.slots.lock().await.state == CallState::Incoming
    }

    /// An incoming call was observed.
    ///
    /// With a call already up (active, held, or already waiting) the new
    /// call goes into the waiting slot and the current slot is untouched;
    /// otherwise it becomes the current call and the state is `Incoming`.
    pub async fn on_incoming_call(&self, handle: CallHandle, number: String) {
        let mut slots = self.slots.lock().await;
        let call_is_up = matches!(
            slots.state,
            CallState::Active | CallState::Hold | CallState::CallWaiting
        ) && slots.current.is_some();

        if call_is_up {
            debug!(
                "call waiting: {} while on call with {:?}",
                number, slots.current_number
            );
            slots.waiting = Some(handle);
            slots.waiting_number = Some(number);
            slots.state = CallState::CallWaiting;
        } else {
            debug!("incoming call: {}", number);
            slots.current = Some(handle);
            slots.current_number = Some(number);
            slots.state = CallState::Incoming;
        }
        let snapshot = slots.snapshot();
        self.notify_listeners(snapshot).await;
    }

    /// An outgoing call was placed.
    ///
    /// Occupies the current slot so the handle is controllable, but does
    /// not change the authoritative state: a dialing call is not yet up,
    /// and [`CallState`] deliberately has no dialing variant. Listeners are
    /// not notified; the UI layer is driven by the router's placement
    /// events until the call connects.
    pub async fn on_outgoing_call(&self, handle: CallHandle, number: String) {
        let mut slots = self.slots.lock().await;
        debug!("outgoing call placed: {}", number);
        slots.current = Some(handle);
        slots.current_number = Some(number);
    }

    /// The current call connected (incoming answered, or outgoing picked
    /// up, or re-reported active after an unhold).
    ///
    /// While a waiting call is pending the state stays `CallWaiting`; a
    /// duplicate active notification for the current handle must not mask
    /// the pending call.
    pub async fn on_call_answered(&self) {
        let mut slots = self.slots.lock().await;
        slots.state = if slots.waiting.is_some() {
            CallState::CallWaiting
        } else {
            CallState::Active
        };
        let snapshot = slots.snapshot();
        self.notify_listeners(snapshot).await;
    }

    /// The current call terminated.
    ///
    /// With a waiting call pending it is promoted to current and the state
    /// stays `Active` (the hand-off rule); otherwise both slots clear and
    /// the state returns to `Idle`.
    pub async fn on_call_ended(&self) {
        let mut slots = self.slots.lock().await;
        if slots.waiting.is_some() {
            slots.promote_waiting();
            slots.state = CallState::Active;
            info!("current call ended, promoted waiting call: {:?}", slots.current_number);
        } else {
            slots.current = None;
            slots.current_number = None;
            slots.state = CallState::Idle;
            debug!("call ended, no waiting call, going idle");
        }
        let snapshot = slots.snapshot();
        self.notify_listeners(snapshot).await;
    }

    /// The waiting call terminated on its own (rang out or was cancelled
    /// remotely).
    ///
    /// Clears only the waiting slot and returns the state to `Active`; the
    /// current call is untouched. This is deliberately a separate entry
    /// point from [`on_call_ended`](Self::on_call_ended) so the two slots
    /// can never be confused.
    pub async fn on_waiting_call_terminated(&self) {
        let mut slots = self.slots.lock().await;
        if slots.waiting.is_none() {
            warn!(
                "waiting call termination reported with no waiting call (state {}), ignoring",
                slots.state
            );
            return;
        }
        debug!("waiting call {:?} terminated, current call preserved", slots.waiting_number);
        slots.clear_waiting();
        slots.state = if slots.current.is_some() {
            CallState::Active
        } else {
            CallState::Idle
        };
        let snapshot = slots.snapshot();
        self.notify_listeners(snapshot).await;
    }

    /// Place the current call on hold (no-op outside `Active`).
    pub async fn on_call_hold(&self) {
        let mut slots = self.slots.lock().await;
        if slots.state != CallState::Active {
            return;
        }
        slots.state = CallState::Hold;
        let snapshot = slots.snapshot();
        self.notify_listeners(snapshot).await;
    }

    /// Resume the current call from hold (no-op outside `Hold`).
    pub async fn on_call_unhold(&self) {
        let mut slots = self.slots.lock().await;
        if slots.state != CallState::Hold {
            return;
        }
        slots.state = CallState::Active;
        let snapshot = slots.snapshot();
        self.notify_listeners(snapshot).await;
    }

    /// Answer the waiting call: hold the current call, answer the waiting
    /// one, and swap it into the current slot.
    ///
    /// Both telecom verbs are attempted; a failure of either is logged but
    /// does not roll back the state transition - the telephony subsystem's
    /// subsequent events are the source of truth.
    pub async fn answer_waiting_call(&self) -> CallCoreResult<()> {
        let mut slots = self.slots.lock().await;
        if slots.state != CallState::CallWaiting {
            return Err(CallCoreError::InvalidState(format!(
                "answer_waiting_call in state {}",
                slots.state
            )));
        }
        let waiting = slots.waiting.clone().ok_or(CallCoreError::NoWaitingCall)?;

        if let Some(current) = slots.current.clone() {
            if let Err(e) = current.hold().await {
                warn!("failed to hold current call before answering waiting call: {}", e);
            }
        }
        if let Err(e) = waiting.answer().await {
            warn!("failed to answer waiting call: {}", e);
        }

        slots.promote_waiting();
        slots.state = CallState::Active;
        info!("answered waiting call: {:?}", slots.current_number);
        let snapshot = slots.snapshot();
        self.notify_listeners(snapshot).await;
        Ok(())
    }

    /// Decline the waiting call: disconnect it and clear the waiting slot,
    /// returning the state to `Active`. The current call is untouched.
    pub async fn decline_waiting_call(&self) -> CallCoreResult<()> {
        let mut slots = self.slots.lock().await;
        if slots.state != CallState::CallWaiting {
            return Err(CallCoreError::InvalidState(format!(
                "decline_waiting_call in state {}",
                slots.state
            )));
        }
        let waiting = slots.waiting.clone().ok_or(CallCoreError::NoWaitingCall)?;

        if let Err(e) = waiting.disconnect().await {
            warn!("failed to disconnect waiting call: {}", e);
        }

        slots.clear_waiting();
        slots.state = CallState::Active;
        info!("declined waiting call, back to active call");
        let snapshot = slots.snapshot();
        self.notify_listeners(snapshot).await;
        Ok(())
    }

    /// Reset to idle, clearing both slots. Used by tests and adapter
    /// teardown; normal termination goes through the event entry points.
    pub async fn reset(&self) {
        let mut slots = self.slots.lock().await;
        slots.current = None;
        slots.current_number = None;
        slots.clear_waiting();
        slots.state = CallState::Idle;
        let snapshot = slots.snapshot();
        debug_assert_eq!(snapshot, CallSnapshot::idle());
        self.notify_listeners(snapshot).await;
    }

    /// Fan the snapshot out to every listener, isolating panics so one bad
    /// observer cannot starve the rest.
    async fn notify_listeners(&self, snapshot: CallSnapshot) {
        let listeners: Vec<Arc<dyn CallStateListener>> =
            self.listeners.read().await.iter().cloned().collect();
        for listener in listeners {
            let fut = listener.on_call_state_changed(snapshot.clone());
            if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                error!("call state listener panicked: {:?}", panic);
            }
        }
    }
}

impl Default for CallStateStore {
    fn default() -> Self {
        Self::new()
    }
}
