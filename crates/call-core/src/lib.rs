//! # Ringside Call Core
//!
//! Call-state reconciliation engine for a dialer-replacement app. The
//! platform's telephony subsystem owns the calls; this crate reconciles the
//! event streams it emits (call-object callbacks, the legacy broadcast
//! phone-state stream, and user actions) into one authoritative call state,
//! then tells the UI layer what to present and the notification layer why a
//! call ended.
//!
//! ## Architecture
//!
//! ```text
//! telecom callbacks ─┐
//! legacy broadcasts ─┼─> CallEventRouter ──> CallStateStore ──> listeners
//! user actions ──────┘         │                  │
//!                              v                  v
//!                     placement policy     EngineEvent broadcast
//!                     disconnect classifier
//! ```
//!
//! * [`store::CallStateStore`] is the single authoritative mutator of
//!   [`call::CallState`], holding the current and waiting call slots.
//! * [`router::CallEventRouter`] is the adapter boundary: it tracks
//!   per-handle [`call::CallRecord`]s, guards every termination against the
//!   waiting slot, runs the disconnect classifier, and re-evaluates UI
//!   placement on every transition.
//! * [`classifier`] resolves *who ended the call and why* from the call's
//!   history and the raw disconnect cause.
//! * [`policy`] decides native screen vs floating overlay.
//! * [`timers::CallTimers`] owns the cancellable screen timeouts and the
//!   duration tick.
//! * [`engine::CallEngine`] composes the above and publishes
//!   [`events::EngineEvent`]s over a broadcast channel.
//!
//! ## Quick start
//!
//! ```rust
//! use ringside_call_core::engine::CallEngine;
//! use ringside_call_core::events::EngineEvent;
//!
//! # tokio_test::block_on(async {
//! let engine = CallEngine::builder().build().await;
//! let mut events = engine.subscribe();
//!
//! // Platform adapters feed engine.ingest(..); consumers render events.
//! # });
//! ```

pub mod call;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod events;
pub mod number;
pub mod policy;
pub mod router;
pub mod store;
pub mod timers;

pub use call::{
    CallDirection, CallHandle, CallHandleId, CallRecord, CallState, DisconnectCause,
    DisconnectOutcome, TelecomCall, TelecomCallState, UNKNOWN_NUMBER,
};
pub use engine::{CallEngine, CallEngineBuilder};
pub use error::{CallCoreError, CallCoreResult};
pub use events::{
    BroadcastState, CallEvent, DisconnectNotice, EngineEvent, SourceKind, UserAction,
};
pub use policy::{ForegroundContext, ScreenKind, UiCallState, UiDecision};
pub use router::{CallEventRouter, ForegroundProbe, NullForegroundProbe};
pub use store::{CallSnapshot, CallStateListener, CallStateStore};
pub use timers::{CallTimers, TimerKind};
