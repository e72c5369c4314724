//! Event types at the engine boundary
//!
//! Telephony events reach the engine from three independent sources: the
//! telecom call-object callback stream, the legacy broadcast phone-state
//! stream, and user-initiated UI actions. [`CallEvent`] is the unified
//! ingestion shape; [`EngineEvent`] is what the engine publishes back out
//! to UI and notification consumers over a broadcast channel.

use serde::{Deserialize, Serialize};

use crate::call::{CallHandle, DisconnectOutcome, TelecomCallState};
use crate::policy::{UiCallState, UiDecision};
use crate::store::CallSnapshot;

/// Which stream produced an ingested event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Telecom call-object callback stream (authoritative when present).
    TelecomCallback,
    /// Legacy broadcast phone-state stream.
    LegacyBroadcast,
    /// User-initiated UI action.
    UserAction,
}

/// Coarse phone state reported by the legacy broadcast stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BroadcastState {
    /// A call is ringing.
    Ringing,
    /// A call is off-hook (dialing, connected, or held).
    Offhook,
    /// No call activity.
    Idle,
}

/// User action routed through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Answer the ringing call (or the waiting call during call waiting).
    Answer,
    /// Reject the ringing call (or decline the waiting call).
    Reject,
    /// Hang up the current call.
    EndCall,
    /// Place the current call on hold.
    Hold,
    /// Resume the current call from hold.
    Unhold,
    /// Start playing a DTMF tone on the current call.
    PlayDtmf(char),
    /// Stop the currently playing DTMF tone.
    StopDtmf,
}

/// Unified ingestion event fed into the router.
///
/// Telecom events carry the live handle; legacy broadcast events carry at
/// most a number candidate; user actions carry neither.
#[derive(Clone)]
pub enum CallEvent {
    /// A call handle appeared in the telecom stream.
    CallAdded {
        handle: CallHandle,
        state: TelecomCallState,
    },
    /// A tracked handle changed raw state.
    CallStateChanged {
        handle: CallHandle,
        state: TelecomCallState,
    },
    /// A tracked handle was removed from the telecom stream.
    CallRemoved { handle: CallHandle },
    /// The legacy broadcast stream reported a phone state.
    PhoneStateChanged {
        state: BroadcastState,
        number: Option<String>,
    },
    /// The user acted on the call UI.
    UserAction(UserAction),
}

impl CallEvent {
    /// Which stream this event belongs to.
    pub fn source_kind(&self) -> SourceKind {
        match self {
            CallEvent::CallAdded { .. }
            | CallEvent::CallStateChanged { .. }
            | CallEvent::CallRemoved { .. } => SourceKind::TelecomCallback,
            CallEvent::PhoneStateChanged { .. } => SourceKind::LegacyBroadcast,
            CallEvent::UserAction(_) => SourceKind::UserAction,
        }
    }
}

impl std::fmt::Debug for CallEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallEvent::CallAdded { handle, state } => f
                .debug_struct("CallAdded")
                .field("handle", &handle.id())
                .field("state", state)
                .finish(),
            CallEvent::CallStateChanged { handle, state } => f
                .debug_struct("CallStateChanged")
                .field("handle", &handle.id())
                .field("state", state)
                .finish(),
            CallEvent::CallRemoved { handle } => f
                .debug_struct("CallRemoved")
                .field("handle", &handle.id())
                .finish(),
            CallEvent::PhoneStateChanged { state, number } => f
                .debug_struct("PhoneStateChanged")
                .field("state", state)
                .field("number", number)
                .finish(),
            CallEvent::UserAction(action) => f.debug_tuple("UserAction").field(action).finish(),
        }
    }
}

/// Terminal notification for the notification/logging boundary.
///
/// Emitted exactly once per terminal transition of the *current* call slot;
/// waiting-slot terminations never produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectNotice {
    /// Why the call ended, resolved by the disconnect classifier.
    pub outcome: DisconnectOutcome,
    /// Best number resolved for the ended call, may be `"Unknown"`.
    pub number: String,
}

/// Event published by the engine over its broadcast channel.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The authoritative call state changed.
    StateChanged(CallSnapshot),
    /// The current call terminated, with its classified outcome.
    Disconnected(DisconnectNotice),
    /// The placement policy selected a presentation for a transition.
    UiUpdate {
        /// Presentation to show.
        decision: UiDecision,
        /// Call state the decision was computed for.
        state: UiCallState,
        /// Number to display.
        number: String,
    },
}
