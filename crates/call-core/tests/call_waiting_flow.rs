//! End-to-end call-waiting scenarios through the public engine API.

use std::sync::Arc;

use ringside_call_core::{
    CallEngine, CallEvent, CallHandleId, CallState, DisconnectCause, DisconnectNotice,
    DisconnectOutcome, EngineEvent, TelecomCall, TelecomCallState, UserAction,
};

struct TestCall {
    id: CallHandleId,
    number: String,
    cause: DisconnectCause,
}

impl TestCall {
    fn new(number: &str, cause: DisconnectCause) -> Arc<Self> {
        Arc::new(Self {
            id: CallHandleId::new(),
            number: number.to_string(),
            cause,
        })
    }
}

#[async_trait::async_trait]
impl TelecomCall for TestCall {
    fn id(&self) -> CallHandleId {
        self.id
    }
    fn remote_number(&self) -> Option<String> {
        Some(self.number.clone())
    }
    async fn answer(&self) -> ringside_call_core::CallCoreResult<()> {
        Ok(())
    }
    async fn hold(&self) -> ringside_call_core::CallCoreResult<()> {
        Ok(())
    }
    async fn unhold(&self) -> ringside_call_core::CallCoreResult<()> {
        Ok(())
    }
    async fn disconnect(&self) -> ringside_call_core::CallCoreResult<()> {
        Ok(())
    }
    fn disconnect_cause(&self) -> DisconnectCause {
        self.cause
    }
}

fn added(call: &Arc<TestCall>, state: TelecomCallState) -> CallEvent {
    CallEvent::CallAdded {
        handle: call.clone(),
        state,
    }
}

fn changed(call: &Arc<TestCall>, state: TelecomCallState) -> CallEvent {
    CallEvent::CallStateChanged {
        handle: call.clone(),
        state,
    }
}

fn removed(call: &Arc<TestCall>) -> CallEvent {
    CallEvent::CallRemoved {
        handle: call.clone(),
    }
}

fn drain_notices(rx: &mut tokio::sync::broadcast::Receiver<EngineEvent>) -> Vec<DisconnectNotice> {
    let mut notices = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let EngineEvent::Disconnected(notice) = event {
            notices.push(notice);
        }
    }
    notices
}

#[tokio::test]
async fn full_call_waiting_decline_flow() {
    let engine = CallEngine::builder().build().await;
    let mut events = engine.subscribe();

    let first = TestCall::new("1000001", DisconnectCause::Remote);
    let second = TestCall::new("2000002", DisconnectCause::Unknown);

    // First call rings and is answered.
    engine.ingest(added(&first, TelecomCallState::Ringing)).await.unwrap();
    engine.ingest(changed(&first, TelecomCallState::Active)).await.unwrap();
    assert_eq!(engine.snapshot().await.state, CallState::Active);

    // Second call arrives: call waiting, first call untouched.
    engine.ingest(added(&second, TelecomCallState::Ringing)).await.unwrap();
    let snap = engine.snapshot().await;
    assert_eq!(snap.state, CallState::CallWaiting);
    assert_eq!(snap.current_number.as_deref(), Some("1000001"));
    assert_eq!(snap.waiting_number.as_deref(), Some("2000002"));

    // User declines the waiting call; back to a plain active call.
    engine.ingest(CallEvent::UserAction(UserAction::Reject)).await.unwrap();
    let snap = engine.snapshot().await;
    assert_eq!(snap.state, CallState::Active);
    assert_eq!(snap.current_number.as_deref(), Some("1000001"));
    assert!(snap.waiting_number.is_none());

    // The declined call's teardown events arrive afterwards; they must not
    // disturb the active call or produce a disconnect notice.
    engine.ingest(changed(&second, TelecomCallState::Disconnected)).await.unwrap();
    engine.ingest(removed(&second)).await.unwrap();
    assert_eq!(engine.snapshot().await.state, CallState::Active);
    assert!(drain_notices(&mut events).is_empty());

    // First call finally ends: exactly one notice, classified as ended by
    // the caller (incoming call, connected, remote hangup).
    engine.ingest(changed(&first, TelecomCallState::Disconnected)).await.unwrap();
    engine.ingest(removed(&first)).await.unwrap();
    assert_eq!(engine.snapshot().await.state, CallState::Idle);

    let notices = drain_notices(&mut events);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].outcome, DisconnectOutcome::EndedByCaller);
    assert_eq!(notices[0].number, "1000001");
}

#[tokio::test]
async fn answer_waiting_then_original_caller_hangs_up() {
    let engine = CallEngine::builder().build().await;
    let mut events = engine.subscribe();

    let first = TestCall::new("1000001", DisconnectCause::Remote);
    let second = TestCall::new("2000002", DisconnectCause::Unknown);

    engine.ingest(added(&first, TelecomCallState::Ringing)).await.unwrap();
    engine.ingest(changed(&first, TelecomCallState::Active)).await.unwrap();
    engine.ingest(added(&second, TelecomCallState::Ringing)).await.unwrap();

    // User answers the waiting call: hand-off swaps slots.
    engine.ingest(CallEvent::UserAction(UserAction::Answer)).await.unwrap();
    let snap = engine.snapshot().await;
    assert_eq!(snap.state, CallState::Active);
    assert_eq!(snap.current_number.as_deref(), Some("2000002"));
    assert!(snap.waiting_number.is_none());
    drain_notices(&mut events);

    // The original caller, now off the current slot, hangs up. Their
    // handle is no longer tracked by either slot, but the record still
    // exists, so the terminal path runs for it.
    engine.ingest(changed(&second, TelecomCallState::Active)).await.unwrap();
    engine.ingest(changed(&first, TelecomCallState::Disconnected)).await.unwrap();
    engine.ingest(removed(&first)).await.unwrap();

    // The call with the second party continues.
    let snap = engine.snapshot().await;
    assert_eq!(snap.current_number.as_deref(), Some("2000002"));
}

#[tokio::test]
async fn waiting_call_ring_out_preserves_active_call() {
    let engine = CallEngine::builder().build().await;
    let mut events = engine.subscribe();

    let first = TestCall::new("1000001", DisconnectCause::Remote);
    let second = TestCall::new("2000002", DisconnectCause::Missed);

    engine.ingest(added(&first, TelecomCallState::Ringing)).await.unwrap();
    engine.ingest(changed(&first, TelecomCallState::Active)).await.unwrap();
    engine.ingest(added(&second, TelecomCallState::Ringing)).await.unwrap();
    drain_notices(&mut events);

    // The waiting caller gives up before the user reacts.
    engine.ingest(changed(&second, TelecomCallState::Disconnected)).await.unwrap();
    engine.ingest(removed(&second)).await.unwrap();

    let snap = engine.snapshot().await;
    assert_eq!(snap.state, CallState::Active);
    assert_eq!(snap.current_number.as_deref(), Some("1000001"));
    assert!(snap.waiting_number.is_none());
    assert!(drain_notices(&mut events).is_empty());
}

#[tokio::test]
async fn outgoing_call_lifecycle_classifies_cancellation() {
    let engine = CallEngine::builder().build().await;
    let mut events = engine.subscribe();

    let call = TestCall::new("5550100", DisconnectCause::Local);

    // Hung up while still connecting, before any ringing was observed.
    engine.ingest(added(&call, TelecomCallState::Dialing)).await.unwrap();
    engine.ingest(changed(&call, TelecomCallState::Connecting)).await.unwrap();
    engine.ingest(CallEvent::UserAction(UserAction::EndCall)).await.unwrap();
    engine.ingest(changed(&call, TelecomCallState::Disconnected)).await.unwrap();
    engine.ingest(removed(&call)).await.unwrap();

    let notices = drain_notices(&mut events);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].outcome, DisconnectOutcome::CancelledByCaller);
    assert_eq!(engine.snapshot().await.state, CallState::Idle);
}
