//! Event router: the adapter boundary of the engine
//!
//! All three event sources funnel through here into the call state store.
//! The router owns the per-handle [`CallRecord`]s (created when a handle
//! first appears, discarded at its terminal transition), the legacy
//! broadcast number cache, and the terminal path: classifying why the
//! current call ended, emitting exactly one [`DisconnectNotice`] per
//! current-slot termination, and re-evaluating the UI placement policy
//! after every transition.
//!
//! # The waiting-slot guard
//!
//! Every termination-shaped event (`Disconnected` raw state, handle
//! removal) first checks whether the handle is the *waiting* call. The
//! waiting branch short-circuits before any current-slot bookkeeping: no
//! disconnect notice, no flag reset, and the store transition is "waiting
//! terminated", which preserves the active call. Getting this wrong reads
//! as "the call ended" while the user is still talking.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::call::{
    CallDirection, CallHandle, CallHandleId, CallRecord, TelecomCallState, UNKNOWN_NUMBER,
};
use crate::classifier::classify;
use crate::error::{CallCoreError, CallCoreResult};
use crate::events::{BroadcastState, CallEvent, DisconnectNotice, EngineEvent, UserAction};
use crate::number;
use crate::policy::{self, ForegroundContext, UiCallState};
use crate::store::CallStateStore;

/// Best-effort foreground-app probe supplied by the platform layer.
///
/// Detection may fail; the probe reports what it can and the placement
/// policy defaults to native UI on unknowns.
#[async_trait::async_trait]
pub trait ForegroundProbe: Send + Sync {
    async fn context(&self) -> ForegroundContext;
}

/// Probe that always reports an unknown foreground, forcing native UI.
pub struct NullForegroundProbe;

#[async_trait::async_trait]
impl ForegroundProbe for NullForegroundProbe {
    async fn context(&self) -> ForegroundContext {
        ForegroundContext::default()
    }
}

/// Routes ingestion events into the store and publishes engine events.
pub struct CallEventRouter {
    store: Arc<CallStateStore>,
    /// Per-handle bookkeeping; entries live from first observation to
    /// terminal transition.
    records: DashMap<CallHandleId, CallRecord>,
    /// Handles whose teardown events must stay silent: a declined waiting
    /// call leaves the waiting slot immediately, but its Disconnected and
    /// Removed events still arrive afterwards.
    silenced: DashMap<CallHandleId, ()>,
    /// Last valid number seen on the legacy broadcast stream.
    broadcast_number: Mutex<Option<String>>,
    probe: Arc<dyn ForegroundProbe>,
    events_tx: broadcast::Sender<EngineEvent>,
}

impl CallEventRouter {
    /// Create a router publishing into `events_tx`.
    pub fn new(
        store: Arc<CallStateStore>,
        probe: Arc<dyn ForegroundProbe>,
        events_tx: broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self {
            store,
            records: DashMap::new(),
            silenced: DashMap::new(),
            broadcast_number: Mutex::new(None),
            probe,
            events_tx,
        }
    }

    /// Dispatch a unified ingestion event.
    pub async fn ingest(&self, event: CallEvent) -> CallCoreResult<()> {
        debug!(source = ?event.source_kind(), "ingest: {:?}", event);
        match event {
            CallEvent::CallAdded { handle, state } => {
                self.on_call_added(handle, state).await;
                Ok(())
            }
            CallEvent::CallStateChanged { handle, state } => {
                self.on_call_state_changed(handle, state).await;
                Ok(())
            }
            CallEvent::CallRemoved { handle } => {
                self.on_call_removed(handle).await;
                Ok(())
            }
            CallEvent::PhoneStateChanged { state, number } => {
                self.on_phone_state_changed(state, number.as_deref()).await;
                Ok(())
            }
            CallEvent::UserAction(action) => self.on_user_action(action).await,
        }
    }

    /// A call handle appeared in the telecom stream.
    pub async fn on_call_added(&self, handle: CallHandle, state: TelecomCallState) {
        let number = self.resolve_for(&handle, None).await;
        debug!("call added: {} state {:?} number {}", handle.id(), state, number);

        match state {
            TelecomCallState::Ringing => {
                let mut record =
                    CallRecord::new(CallDirection::Incoming, number.clone(), state);
                record.mark_ringing();
                self.records.insert(handle.id(), record);

                self.store.on_incoming_call(handle, number.clone()).await;

                // A ringing call behind an active one is call waiting; the
                // in-call UI handles it and no incoming screen is launched.
                if self.store.is_call_waiting().await {
                    debug!("ringing call joined as call waiting, no incoming UI");
                } else {
                    self.publish_ui(UiCallState::Ringing, number).await;
                }
            }
            TelecomCallState::Dialing | TelecomCallState::Connecting => {
                self.records.insert(
                    handle.id(),
                    CallRecord::new(CallDirection::Outgoing, number.clone(), state),
                );
                self.store.on_outgoing_call(handle, number.clone()).await;
                self.publish_ui(UiCallState::Dialing, number).await;
            }
            TelecomCallState::Active => {
                // Already connected when first observed (service bound late).
                let mut record = CallRecord::new(CallDirection::Outgoing, number.clone(), state);
                record.mark_connected();
                self.records.insert(handle.id(), record);
                self.store.on_outgoing_call(handle, number.clone()).await;
                self.store.on_call_answered().await;
                self.publish_ui(UiCallState::Connected, number).await;
            }
            _ => {
                self.records
                    .insert(handle.id(), CallRecord::new(CallDirection::Outgoing, number, state));
            }
        }
    }

    /// A tracked handle changed raw state.
    pub async fn on_call_state_changed(&self, handle: CallHandle, state: TelecomCallState) {
        let id = handle.id();
        let resolved = self.resolve_for(&handle, None).await;
        let number = {
            let mut entry = self.records.entry(id).or_insert_with(|| {
                // State change for a handle we never saw added; infer the
                // direction from the state and start tracking it.
                let direction = if state == TelecomCallState::Ringing {
                    CallDirection::Incoming
                } else {
                    CallDirection::Outgoing
                };
                CallRecord::new(direction, UNKNOWN_NUMBER.to_string(), state)
            });
            entry.last_observed_state = state;
            if !number::is_valid(&entry.best_number) && number::is_valid(&resolved) {
                entry.best_number = resolved.clone();
            }
            entry.best_number.clone()
        };

        match state {
            TelecomCallState::Dialing | TelecomCallState::Connecting => {
                self.publish_ui(UiCallState::Dialing, number).await;
            }
            TelecomCallState::Ringing => {
                let direction = match self.records.get_mut(&id) {
                    Some(mut entry) => {
                        entry.mark_ringing();
                        entry.direction
                    }
                    None => CallDirection::Incoming,
                };
                if direction == CallDirection::Outgoing {
                    // Outgoing call alerting remotely; keep the dialing
                    // presentation.
                    self.publish_ui(UiCallState::Dialing, number).await;
                } else if self.store.has_active_call().await {
                    debug!("ringing while a call is up, treating as call waiting");
                } else {
                    self.publish_ui(UiCallState::Ringing, number).await;
                }
            }
            TelecomCallState::Active => {
                if let Some(mut entry) = self.records.get_mut(&id) {
                    entry.mark_connected();
                }
                // A waiting call going active means the hand-off already
                // happened through answer_waiting_call; only the current
                // slot transitions here.
                if !self.store.is_waiting_handle(id).await {
                    self.store.on_call_answered().await;
                }
                self.publish_ui(UiCallState::Connected, number).await;
            }
            TelecomCallState::Holding => {
                if self.store.is_current_handle(id).await {
                    self.store.on_call_hold().await;
                }
            }
            TelecomCallState::Disconnected => {
                self.on_handle_terminated(handle).await;
            }
            TelecomCallState::New => {}
        }
    }

    /// A tracked handle was removed from the telecom stream.
    pub async fn on_call_removed(&self, handle: CallHandle) {
        let id = handle.id();

        // Waiting call removed: the active call is still ongoing. Clear
        // the waiting slot and nothing else.
        if self.store.is_waiting_handle(id).await {
            debug!("waiting call removed, preserving active call context");
            self.records.remove(&id);
            self.store.on_waiting_call_terminated().await;
            return;
        }

        if self.records.contains_key(&id) {
            // Removal without a prior Disconnected notification still runs
            // the terminal path exactly once.
            self.on_handle_terminated(handle).await;
        }
    }

    /// The legacy broadcast stream reported a phone state.
    ///
    /// The telecom stream is authoritative whenever a handle is tracked;
    /// the broadcast stream then only feeds the number cache. Without any
    /// tracked handle it additionally drives UI placement for ringing.
    pub async fn on_phone_state_changed(&self, state: BroadcastState, number: Option<&str>) {
        let cached = self.broadcast_number.lock().await.clone();
        let resolved = number::resolve([number, cached.as_deref()]);
        if number::is_valid(&resolved) {
            *self.broadcast_number.lock().await = Some(resolved.clone());
        }

        if !self.records.is_empty() {
            debug!("broadcast {:?} ignored for state, telecom stream is live", state);
            return;
        }

        match state {
            BroadcastState::Ringing => {
                self.publish_ui(UiCallState::Ringing, resolved).await;
            }
            BroadcastState::Offhook => {
                debug!("broadcast offhook for {}", resolved);
            }
            BroadcastState::Idle => {
                // The cached number stays useful to late lookups; the next
                // valid observation replaces it anyway.
                debug!("broadcast idle, cached number {:?}", cached);
            }
        }
    }

    /// Route a user action to the right slot.
    ///
    /// During call waiting, answer/reject target the waiting call, exactly
    /// as the two buttons on the in-call screen do.
    pub async fn on_user_action(&self, action: UserAction) -> CallCoreResult<()> {
        match action {
            UserAction::Answer => {
                if self.store.is_call_waiting().await {
                    return self.store.answer_waiting_call().await;
                }
                let current = self
                    .store
                    .current_call()
                    .await
                    .ok_or(CallCoreError::NoCurrentCall)?;
                current.answer().await
            }
            UserAction::Reject => {
                if self.store.is_call_waiting().await {
                    // The slot clears as soon as the decline commits; mark
                    // the handle so its teardown events stay silent.
                    if let Some(waiting) = self.store.waiting_call().await {
                        self.silenced.insert(waiting.id(), ());
                    }
                    return self.store.decline_waiting_call().await;
                }
                let current = self
                    .store
                    .current_call()
                    .await
                    .ok_or(CallCoreError::NoCurrentCall)?;
                current.disconnect().await
            }
            UserAction::EndCall => {
                let current = self
                    .store
                    .current_call()
                    .await
                    .ok_or(CallCoreError::NoCurrentCall)?;
                current.disconnect().await
            }
            UserAction::Hold => {
                let current = self
                    .store
                    .current_call()
                    .await
                    .ok_or(CallCoreError::NoCurrentCall)?;
                current.hold().await
            }
            UserAction::Unhold => {
                let current = self
                    .store
                    .current_call()
                    .await
                    .ok_or(CallCoreError::NoCurrentCall)?;
                current.unhold().await
            }
            UserAction::PlayDtmf(tone) => {
                let current = self
                    .store
                    .current_call()
                    .await
                    .ok_or(CallCoreError::NoCurrentCall)?;
                current.play_dtmf(tone).await
            }
            UserAction::StopDtmf => {
                let current = self
                    .store
                    .current_call()
                    .await
                    .ok_or(CallCoreError::NoCurrentCall)?;
                current.stop_dtmf().await
            }
        }
    }

    /// Terminal path for a handle that disconnected or was removed.
    ///
    /// The waiting-slot branch is checked first and never reaches the
    /// classifier or the notice; the current-slot branch classifies,
    /// notifies once, resets the record's flags, and hands the store the
    /// termination (which promotes a pending waiting call).
    async fn on_handle_terminated(&self, handle: CallHandle) {
        let id = handle.id();

        if self.store.is_waiting_handle(id).await {
            // Waiting call disconnected on its own (rang out or cancelled
            // remotely). Not a "call ended": the active call continues.
            info!("waiting call disconnected, preserving active call");
            self.records.remove(&id);
            self.store.on_waiting_call_terminated().await;
            return;
        }

        if self.silenced.remove(&id).is_some() {
            debug!("teardown of declined waiting call {} suppressed", id);
            self.records.remove(&id);
            return;
        }

        let cause = handle.disconnect_cause();
        let (outcome, record_number) = match self.records.get_mut(&id) {
            Some(mut record) => {
                let outcome = classify(
                    record.ever_connected(),
                    record.direction,
                    record.saw_ringing(),
                    cause,
                );
                // Flag reset is scoped to the current slot's terminal
                // transition and happens exactly once, here.
                record.reset_flags();
                (outcome, record.best_number.clone())
            }
            None => {
                warn!("terminal event for untracked handle {}", id);
                (
                    classify(false, CallDirection::Outgoing, false, cause),
                    UNKNOWN_NUMBER.to_string(),
                )
            }
        };
        self.records.remove(&id);

        let number = self.resolve_for(&handle, Some(&record_number)).await;
        info!(
            "call {} terminated: cause {:?} outcome {} number {}",
            id, cause, outcome, number
        );

        self.publish(EngineEvent::Disconnected(DisconnectNotice {
            outcome,
            number,
        }));

        // Only the current slot's termination transitions the store. A
        // handle displaced by a waiting-call hand-off can disconnect later;
        // its notice is still emitted but the live call is untouched.
        if self.store.is_current_handle(id).await {
            self.store.on_call_ended().await;
        } else {
            debug!("terminated handle {} not in the current slot, store untouched", id);
        }
    }

    /// Current foreground context as the placement policy would see it.
    pub async fn foreground_context(&self) -> ForegroundContext {
        self.probe.context().await
    }

    /// Resolve the best number for a handle: explicit candidate first, then
    /// the live handle, then the legacy broadcast cache.
    async fn resolve_for(&self, handle: &CallHandle, explicit: Option<&str>) -> String {
        let handle_number = handle.remote_number();
        let cached = self.broadcast_number.lock().await.clone();
        number::resolve([explicit, handle_number.as_deref(), cached.as_deref()])
    }

    /// Re-evaluate placement for a transition and publish the decision.
    async fn publish_ui(&self, state: UiCallState, number: String) {
        let ctx = self.probe.context().await;
        let decision = policy::decide(state, &ctx);
        debug!("ui placement for {:?}: {:?}", state, decision);
        self.publish(EngineEvent::UiUpdate {
            decision,
            state,
            number,
        });
    }

    fn publish(&self, event: EngineEvent) {
        // Broadcast send fails only when no receiver is subscribed, which
        // is a legal steady state.
        let _ = self.events_tx.send(event);
    }
}
