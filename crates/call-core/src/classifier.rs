//! Disconnect outcome classification
//!
//! Terminal telecom disconnect codes are ambiguous about *who* ended a
//! call: a `Local` cause covers "I hung up a live call", "I rejected a
//! ringing call" and "I gave up dialing". [`classify`] resolves the
//! ambiguity deterministically from the call's own history - whether it was
//! ever connected, its direction, and (for outgoing calls) whether it was
//! observed ringing before termination.
//!
//! The function is pure; the terminal side effects (disconnect notice,
//! per-call flag reset) are owned by the event router.
//!
//! # Examples
//!
//! ```rust
//! use ringside_call_core::call::{CallDirection, DisconnectCause, DisconnectOutcome};
//! use ringside_call_core::classifier::classify;
//!
//! // We hung up a connected outgoing call: we (the caller) ended it.
//! let outcome = classify(true, CallDirection::Outgoing, true, DisconnectCause::Local);
//! assert_eq!(outcome, DisconnectOutcome::EndedByCaller);
//!
//! // We gave up while an outgoing call was still ringing.
//! let outcome = classify(false, CallDirection::Outgoing, true, DisconnectCause::Local);
//! assert_eq!(outcome, DisconnectOutcome::NoAnswer);
//! ```

use crate::call::{CallDirection, DisconnectCause, DisconnectOutcome};

/// Derive the outcome of a terminated call.
///
/// * `ever_connected` - whether the call was connected at any point
/// * `direction` - who placed the call
/// * `saw_ringing` - whether the handle was observed ringing (consulted
///   only for never-connected outgoing calls under a `Local` cause)
/// * `cause` - the terminal disconnect cause code
pub fn classify(
    ever_connected: bool,
    direction: CallDirection,
    saw_ringing: bool,
    cause: DisconnectCause,
) -> DisconnectOutcome {
    use CallDirection::*;
    use DisconnectCause::*;

    match cause {
        Local => {
            if ever_connected {
                // Connected call, this device ended it.
                match direction {
                    Outgoing => DisconnectOutcome::EndedByCaller,
                    Incoming => DisconnectOutcome::EndedByCallee,
                }
            } else {
                match direction {
                    // Never connected: user gave up while ringing, or
                    // cancelled before the far end ever rang.
                    Outgoing if saw_ringing => DisconnectOutcome::NoAnswer,
                    Outgoing => DisconnectOutcome::CancelledByCaller,
                    Incoming => DisconnectOutcome::DeclinedByCallee,
                }
            }
        }
        Remote | Rejected => {
            if ever_connected {
                // Connected call, the remote party ended it.
                match direction {
                    Outgoing => DisconnectOutcome::EndedByCallee,
                    Incoming => DisconnectOutcome::EndedByCaller,
                }
            } else {
                match direction {
                    // Outgoing and never connected: they declined.
                    Outgoing => DisconnectOutcome::DeclinedByCallee,
                    // Incoming and never connected: they hung up before we
                    // answered, i.e. we missed it.
                    Incoming => DisconnectOutcome::NoAnswer,
                }
            }
        }
        Busy => DisconnectOutcome::Busy,
        Missed => DisconnectOutcome::NoAnswer,
        Error | Canceled | Restricted | AnsweredElsewhere | Other | Unknown => {
            if ever_connected {
                match direction {
                    Outgoing => DisconnectOutcome::EndedByCaller,
                    Incoming => DisconnectOutcome::EndedByCallee,
                }
            } else {
                match direction {
                    Outgoing => DisconnectOutcome::CancelledByCaller,
                    // Inherited from the source implementation; an incoming
                    // call that never connected was arguably declined by the
                    // *callee*, but the historical label is kept.
                    Incoming => DisconnectOutcome::DeclinedByCaller,
                }
            }
        }
    }
}
