//! Core call types for the reconciliation engine
//!
//! This module contains the data model shared by every component: the
//! authoritative [`CallState`], the raw per-handle [`TelecomCallState`]
//! mirror, disconnect causes and outcomes, and the [`TelecomCall`] trait
//! that abstracts the live call objects owned by the telephony subsystem.
//!
//! # Ownership
//!
//! The engine never owns a call's lifecycle. It holds references to at most
//! two live handles (current + waiting) and compares them by
//! [`CallHandleId`], never by pointer identity. Per-call bookkeeping lives
//! in [`CallRecord`], created when a handle first appears and discarded when
//! it is removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::CallCoreResult;

/// Sentinel used wherever no valid phone number could be resolved.
pub const UNKNOWN_NUMBER: &str = "Unknown";

/// Unique identifier for a live call handle.
///
/// Handle identity is the only way the engine distinguishes the current
/// call from the waiting call; all waiting-slot short-circuits compare ids.
///
/// # Examples
///
/// ```rust
/// use ringside_call_core::call::CallHandleId;
///
/// let a = CallHandleId::new();
/// let b = CallHandleId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallHandleId(pub uuid::Uuid);

impl CallHandleId {
    /// Create a fresh handle identity.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for CallHandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authoritative device-wide call state.
///
/// Exactly one instance of this state exists per engine; all transitions
/// funnel through the call state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallState {
    /// No call activity.
    Idle,
    /// An incoming call is ringing and no other call is up.
    Incoming,
    /// A call is connected and live.
    Active,
    /// The current call is on hold.
    Hold,
    /// A call is connected and a second incoming call is waiting.
    CallWaiting,
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CallState::Idle => "IDLE",
            CallState::Incoming => "INCOMING",
            CallState::Active => "ACTIVE",
            CallState::Hold => "HOLD",
            CallState::CallWaiting => "CALL_WAITING",
        };
        write!(f, "{}", s)
    }
}

/// Raw state of a single call handle as reported by the telecom stream.
///
/// This mirrors the most recent notification for one handle; it is not the
/// authoritative device state (two handles can be in different raw states
/// during call waiting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TelecomCallState {
    /// Handle created, nothing observed yet.
    New,
    /// Outgoing call is being placed.
    Dialing,
    /// Outgoing call is connecting at the network layer.
    Connecting,
    /// Handle is ringing (incoming) or alerting remotely (outgoing).
    Ringing,
    /// Call is connected.
    Active,
    /// Call is held.
    Holding,
    /// Call has terminated.
    Disconnected,
}

/// Direction of a call, set once when the handle first appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallDirection {
    /// Call placed from this device.
    Outgoing,
    /// Call received by this device.
    Incoming,
}

/// Terminal disconnect cause reported by the telephony subsystem.
///
/// Codes are ambiguous about *who* ended a call; the disconnect classifier
/// resolves that using the call's own history. Everything outside the named
/// table rows (`Error`, `Canceled`, `Restricted`, `Other`, `Unknown`, ...)
/// takes the fallback branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisconnectCause {
    /// This device hung up.
    Local,
    /// The remote party hung up.
    Remote,
    /// The remote party rejected the call.
    Rejected,
    /// The remote line was busy.
    Busy,
    /// The call rang out unanswered.
    Missed,
    /// The telephony stack reported an error.
    Error,
    /// The call was torn down before setup completed.
    Canceled,
    /// The call was blocked by a restriction.
    Restricted,
    /// Answered on another device.
    AnsweredElsewhere,
    /// Any other reported cause.
    Other,
    /// No cause was available.
    Unknown,
}

/// Human-meaningful outcome of a terminated call.
///
/// "Caller" is always the party that placed the call and "callee" the party
/// that received it, regardless of which side this device was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisconnectOutcome {
    /// A connected call ended by the party that placed it.
    EndedByCaller,
    /// A connected call ended by the party that received it.
    EndedByCallee,
    /// A never-connected call declined by the receiving party.
    DeclinedByCallee,
    /// A never-connected call declined by the placing party (inherited
    /// fallback label, see the classifier).
    DeclinedByCaller,
    /// An outgoing call cancelled before it ever rang.
    CancelledByCaller,
    /// A call that rang but was never answered.
    NoAnswer,
    /// The remote line was busy.
    Busy,
}

impl std::fmt::Display for DisconnectOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DisconnectOutcome::EndedByCaller => "CALL_ENDED_BY_CALLER",
            DisconnectOutcome::EndedByCallee => "CALL_ENDED_BY_CALLEE",
            DisconnectOutcome::DeclinedByCallee => "CALL_DECLINED_BY_CALLEE",
            DisconnectOutcome::DeclinedByCaller => "CALL_DECLINED_BY_CALLER",
            DisconnectOutcome::CancelledByCaller => "CALL_CANCELLED_BY_CALLER",
            DisconnectOutcome::NoAnswer => "CALL_NO_ANSWER",
            DisconnectOutcome::Busy => "CALL_BUSY",
        };
        write!(f, "{}", s)
    }
}

/// Live call handle owned by the telephony subsystem.
///
/// The engine calls the control verbs but never manages the handle's
/// lifecycle; the ingesting adapter reports additions, state changes and
/// removals. Verb failures are surfaced as errors and, for the
/// waiting-call hand-off, logged without rolling back state.
#[async_trait::async_trait]
pub trait TelecomCall: Send + Sync {
    /// Stable identity of this handle.
    fn id(&self) -> CallHandleId;

    /// Number reported by the telephony subsystem for this handle, if any.
    fn remote_number(&self) -> Option<String>;

    /// Answer a ringing call.
    async fn answer(&self) -> CallCoreResult<()>;

    /// Place the call on hold.
    async fn hold(&self) -> CallCoreResult<()>;

    /// Resume a held call.
    async fn unhold(&self) -> CallCoreResult<()>;

    /// Hang up / reject the call.
    async fn disconnect(&self) -> CallCoreResult<()>;

    /// Terminal cause, meaningful once the handle has disconnected.
    fn disconnect_cause(&self) -> DisconnectCause {
        DisconnectCause::Unknown
    }

    /// Start playing a DTMF tone on the call.
    async fn play_dtmf(&self, _tone: char) -> CallCoreResult<()> {
        Ok(())
    }

    /// Stop the currently playing DTMF tone.
    async fn stop_dtmf(&self) -> CallCoreResult<()> {
        Ok(())
    }
}

/// Shared reference to a live call handle.
pub type CallHandle = Arc<dyn TelecomCall>;

/// Per-call ephemeral bookkeeping.
///
/// Created when a handle first appears, destroyed when it terminates. The
/// two history flags are monotonic while the call is alive:
/// `ever_connected` records that the call was connected at least once, and
/// `saw_ringing` that the handle was observed ringing/alerting (used only
/// for outgoing calls, to tell "gave up while ringing" from "cancelled
/// before ringing").
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// Direction, set once at creation.
    pub direction: CallDirection,
    /// Whether the call was ever connected. Monotonic false -> true.
    ever_connected: bool,
    /// Whether the handle was ever observed ringing. Monotonic.
    saw_ringing: bool,
    /// Most recent raw state notification for this handle.
    pub last_observed_state: TelecomCallState,
    /// Best number resolved for this call so far, may be `"Unknown"`.
    pub best_number: String,
    /// When the handle was first observed.
    pub created_at: DateTime<Utc>,
}

impl CallRecord {
    /// Create a record for a newly observed handle.
    pub fn new(direction: CallDirection, best_number: String, state: TelecomCallState) -> Self {
        Self {
            direction,
            ever_connected: false,
            saw_ringing: false,
            last_observed_state: state,
            best_number,
            created_at: Utc::now(),
        }
    }

    /// Record that the call has connected. Never reverts.
    pub fn mark_connected(&mut self) {
        self.ever_connected = true;
    }

    /// Record that the handle was observed ringing. Never reverts.
    pub fn mark_ringing(&mut self) {
        self.saw_ringing = true;
    }

    /// Whether the call was ever connected.
    pub fn ever_connected(&self) -> bool {
        self.ever_connected
    }

    /// Whether the handle was ever observed ringing.
    pub fn saw_ringing(&self) -> bool {
        self.saw_ringing
    }

    /// Reset the history flags after the current slot's terminal
    /// transition has been fully processed.
    pub fn reset_flags(&mut self) {
        self.ever_connected = false;
        self.saw_ringing = false;
    }
}
