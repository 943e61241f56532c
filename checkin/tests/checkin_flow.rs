//! End-to-end check-in flows through the store
//!
//! Drives the reducer with the real runtime against the in-memory ticket
//! service: effects run as tasks, responses feed back as actions.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::sync::Arc;
use std::time::Duration;
use turnstile_checkin::mocks::MockTicketApi;
use turnstile_checkin::reducer::{SUMMARY_EFFECT, VERIFY_EFFECT};
use turnstile_checkin::verification::{FAILED_MESSAGE, NOT_SIGNED_IN_MESSAGE};
use turnstile_checkin::{
    Attendee, CheckInAction, CheckInEnvironment, CheckInError, CheckInReducer, CheckInReceipt,
    CheckInState, Event, EventId, EventSummary, Outcome, Role, Session, SummaryReport,
    VerificationOutcome, View,
};
use turnstile_runtime::Store;
use turnstile_testing::test_clock;

type TestStore = Store<
    CheckInState,
    CheckInAction,
    CheckInEnvironment<MockTicketApi>,
    CheckInReducer<MockTicketApi>,
>;

const TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Test Fixtures
// ============================================================================

fn session() -> Session {
    Session::new("tok", "tenant-1", Role::Staff)
}

fn events() -> Vec<Event> {
    vec![Event::new("evt-1", "Launch"), Event::new("evt-2", "Afterparty")]
}

fn store_with(api: MockTicketApi, session: Option<Session>) -> TestStore {
    let env = CheckInEnvironment::new(api, session, Arc::new(test_clock()));
    Store::new(CheckInState::new(5), CheckInReducer::new(), env)
}

async fn send(store: &TestStore, action: CheckInAction) {
    let mut handle = store.send(action).await.unwrap();
    handle.wait_with_timeout(TIMEOUT).await.unwrap();
}

async fn ready_store(api: MockTicketApi) -> TestStore {
    let store = store_with(api.with_events(events()), Some(session()));
    send(&store, CheckInAction::LoadEvents).await;
    store
}

async fn verify(store: &TestStore, code: &str) -> VerificationOutcome {
    send(
        store,
        CheckInAction::QrScanned {
            payload: code.to_string(),
        },
    )
    .await;
    store
        .state(|s| s.verification.result().map(|r| r.outcome.clone()))
        .await
        .expect("verification should have completed")
}

// ============================================================================
// Event selector
// ============================================================================

#[tokio::test]
async fn test_event_list_failure_is_recorded() {
    let api = MockTicketApi::new()
        .with_events_error(CheckInError::Http {
            status: 503,
            message: Some("Service unavailable".to_string()),
        })
        .with_valid_ticket("TCK-1", None);
    let store = store_with(api.clone(), Some(session()));

    send(&store, CheckInAction::LoadEvents).await;
    send(
        &store,
        CheckInAction::QrScanned {
            payload: "TCK-1".to_string(),
        },
    )
    .await;

    let (error, selected, loading) = store
        .state(|s| (s.events_error.clone(), s.selected_event.clone(), s.events_loading))
        .await;
    assert_eq!(
        error.as_ref().and_then(CheckInError::server_message),
        Some("Service unavailable")
    );
    assert!(selected.is_none());
    assert!(!loading);
    assert!(api.mark_used_calls().is_empty());
}

// ============================================================================
// Verification
// ============================================================================

#[tokio::test]
async fn test_valid_ticket_shows_server_message() {
    let store = ready_store(MockTicketApi::new().with_valid_ticket("TCK-1001", Some("OK"))).await;

    let outcome = verify(&store, "TCK-1001").await;

    assert_eq!(outcome.outcome, Outcome::Success);
    assert_eq!(outcome.message, "OK");
}

#[tokio::test]
async fn test_used_ticket_shows_server_message() {
    let api = MockTicketApi::new().with_verdict(
        "TCK-1001",
        Err(CheckInError::Rejected {
            message: Some("Already used".to_string()),
        }),
    );
    let store = ready_store(api).await;

    let outcome = verify(&store, "TCK-1001").await;

    assert_eq!(outcome, VerificationOutcome::invalid("Already used"));
}

#[tokio::test]
async fn test_network_failure_shows_canned_message() {
    let api = MockTicketApi::new().with_verdict(
        "TCK-1001",
        Err(CheckInError::Transport("connection reset".to_string())),
    );
    let store = ready_store(api).await;

    let outcome = verify(&store, "TCK-1001").await;

    assert_eq!(outcome, VerificationOutcome::invalid(FAILED_MESSAGE));
    assert!(!store.state(|s| s.verification.is_verifying()).await);
}

#[tokio::test]
async fn test_typed_code_is_trimmed() {
    let api = MockTicketApi::new().with_valid_ticket("TCK-1001", None);
    let store = ready_store(api.clone()).await;

    send(
        &store,
        CheckInAction::InputChanged {
            text: "  TCK-1001  ".to_string(),
        },
    )
    .await;
    send(&store, CheckInAction::Submit).await;

    assert_eq!(
        api.mark_used_calls(),
        vec![(EventId::new("evt-1"), "TCK-1001".to_string())]
    );
}

#[tokio::test]
async fn test_response_action_is_observable() {
    let store = ready_store(MockTicketApi::new().with_valid_ticket("TCK-1", Some("OK"))).await;

    let action = store
        .send_and_wait_for(
            CheckInAction::QrScanned {
                payload: "TCK-1".to_string(),
            },
            |a| matches!(a, CheckInAction::VerificationCompleted { .. }),
            TIMEOUT,
        )
        .await
        .unwrap();

    let CheckInAction::VerificationCompleted { outcome, .. } = action else {
        panic!("unexpected action {action:?}");
    };
    assert_eq!(outcome, VerificationOutcome::success("OK"));
    assert!(store.state(|s| s.verification.result().is_some()).await);
}

#[tokio::test]
async fn test_newer_scan_wins_over_slow_response() {
    let api = MockTicketApi::new()
        .with_valid_ticket("TCK-SLOW", Some("slow"))
        .with_verification_delay("TCK-SLOW", Duration::from_millis(200))
        .with_verdict(
            "TCK-FAST",
            Err(CheckInError::Rejected {
                message: Some("Already used".to_string()),
            }),
        );
    let store = ready_store(api).await;

    let _slow = store
        .send(CheckInAction::QrScanned {
            payload: "TCK-SLOW".to_string(),
        })
        .await
        .unwrap();
    let outcome = verify(&store, "TCK-FAST").await;
    assert_eq!(outcome, VerificationOutcome::invalid("Already used"));

    // Long enough for the slow response to have arrived had it not been aborted
    tokio::time::sleep(Duration::from_millis(300)).await;

    let result = store.state(|s| s.verification.result().cloned()).await.unwrap();
    assert_eq!(result.ticket_code, "TCK-FAST");
    assert!(!store.is_running(VERIFY_EFFECT));
}

#[tokio::test]
async fn test_confirm_repeats_mark_used() {
    let api = MockTicketApi::new().with_valid_ticket("TCK-1", Some("OK"));
    let store = ready_store(api.clone()).await;

    verify(&store, "TCK-1").await;
    send(&store, CheckInAction::ConfirmCheckIn).await;

    assert_eq!(api.mark_used_calls().len(), 2);
}

// ============================================================================
// Input and event switching
// ============================================================================

#[tokio::test]
async fn test_clearing_input_hides_result() {
    let store = ready_store(MockTicketApi::new().with_valid_ticket("TCK-1", None)).await;
    verify(&store, "TCK-1").await;

    send(
        &store,
        CheckInAction::InputChanged {
            text: String::new(),
        },
    )
    .await;

    let (idle, result) = store
        .state(|s| (s.verification.is_idle(), s.verification.result().cloned()))
        .await;
    assert!(idle);
    assert!(result.is_none());
}

#[tokio::test]
async fn test_switching_event_uses_new_id() {
    let api = MockTicketApi::new()
        .with_valid_ticket("TCK-1", None)
        .with_valid_ticket("TCK-2", None);
    let store = ready_store(api.clone()).await;

    verify(&store, "TCK-1").await;
    send(
        &store,
        CheckInAction::SelectEvent {
            event_id: EventId::new("evt-2"),
        },
    )
    .await;
    assert!(store.state(|s| s.verification.result().is_none()).await);

    verify(&store, "TCK-2").await;

    let calls = api.mark_used_calls();
    assert_eq!(calls[0].0, EventId::new("evt-1"));
    assert_eq!(calls[1], (EventId::new("evt-2"), "TCK-2".to_string()));
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn test_missing_session_sends_nothing() {
    let api = MockTicketApi::new()
        .with_events(events())
        .with_valid_ticket("TCK-1", None);
    let store = store_with(api.clone(), None);

    send(&store, CheckInAction::LoadEvents).await;
    let error = store.state(|s| s.events_error.clone()).await;
    assert_eq!(error, Some(CheckInError::MissingSession));

    // Verification is still guarded when an event is somehow known
    let store = store_with(api.clone(), None);
    send(
        &store,
        CheckInAction::EventsLoaded {
            result: Ok(events()),
        },
    )
    .await;
    let outcome = verify(&store, "TCK-1").await;

    assert_eq!(outcome, VerificationOutcome::invalid(NOT_SIGNED_IN_MESSAGE));
    assert!(api.calls().is_empty());
}

// ============================================================================
// Attendance summary
// ============================================================================

fn attendees(n: usize) -> Vec<Attendee> {
    (0..n)
        .map(|i| Attendee {
            id: format!("a{i}"),
            name: format!("Guest {i}"),
            email: format!("guest{i}@example.com"),
            address: "1 Main St".to_string(),
            quantity: 1,
            checked_in_count: u32::from(i % 2 == 0),
            remaining_count: u32::from(i % 2 != 0),
        })
        .collect()
}

#[tokio::test]
async fn test_summary_pagination() {
    let event = EventId::new("evt-1");
    let report = SummaryReport {
        summary: EventSummary {
            total_tickets: 12,
            checked_in: 6,
            remaining: 6,
        },
        attendees: attendees(12),
    };
    let store = ready_store(MockTicketApi::new().with_summary(&event, report)).await;

    send(&store, CheckInAction::OpenSummary).await;
    let (view, page, total) = store
        .state(|s| {
            let ids: Vec<String> = s.summary.page().iter().map(|a| a.id.clone()).collect();
            (s.view, ids, s.summary.total_pages())
        })
        .await;
    assert_eq!(view, View::Summary);
    assert_eq!(page, vec!["a0", "a1", "a2", "a3", "a4"]);
    assert_eq!(total, 3);

    send(&store, CheckInAction::SetSummaryPage { page: 3 }).await;
    let page: Vec<String> = store
        .state(|s| s.summary.page().iter().map(|a| a.id.clone()).collect())
        .await;
    assert_eq!(page, vec!["a10", "a11"]);
}

#[tokio::test]
async fn test_summary_failure_is_rendered() {
    let event = EventId::new("evt-1");
    let api = MockTicketApi::new().with_summary_error(
        &event,
        CheckInError::Http {
            status: 503,
            message: None,
        },
    );
    let store = ready_store(api).await;

    send(&store, CheckInAction::OpenSummary).await;

    let error = store.state(|s| s.summary.error.clone()).await;
    assert_eq!(
        error,
        Some(CheckInError::Http {
            status: 503,
            message: None
        })
    );
}

#[tokio::test]
async fn test_switching_event_while_summary_open_reloads() {
    let first = EventId::new("evt-1");
    let second = EventId::new("evt-2");
    let api = MockTicketApi::new()
        .with_summary(
            &first,
            SummaryReport {
                summary: EventSummary::default(),
                attendees: attendees(1),
            },
        )
        .with_summary(
            &second,
            SummaryReport {
                summary: EventSummary::default(),
                attendees: attendees(7),
            },
        );
    let store = ready_store(api).await;

    send(&store, CheckInAction::OpenSummary).await;
    send(
        &store,
        CheckInAction::SelectEvent {
            event_id: second.clone(),
        },
    )
    .await;

    let (event_id, count) = store
        .state(|s| (s.summary.event_id.clone(), s.summary.attendees.len()))
        .await;
    assert_eq!(event_id, Some(second));
    assert_eq!(count, 7);
}

#[tokio::test]
async fn test_receipt_without_message_uses_canned_text() {
    let api = MockTicketApi::new().with_verdict("TCK-1", Ok(CheckInReceipt::default()));
    let store = ready_store(api).await;

    let outcome = verify(&store, "TCK-1").await;

    assert_eq!(
        outcome,
        VerificationOutcome::success(turnstile_checkin::verification::VERIFIED_MESSAGE)
    );
}

#[tokio::test]
async fn test_closing_summary_drops_slow_load() {
    let event = EventId::new("evt-1");
    let api = MockTicketApi::new()
        .with_summary(
            &event,
            SummaryReport {
                summary: EventSummary::default(),
                attendees: attendees(3),
            },
        )
        .with_summary_delay(Duration::from_millis(200));
    let store = ready_store(api).await;

    let _load = store.send(CheckInAction::OpenSummary).await.unwrap();
    assert!(store.is_running(SUMMARY_EFFECT));
    send(&store, CheckInAction::CloseSummary).await;

    // Long enough for the load to have landed had it not been aborted
    tokio::time::sleep(Duration::from_millis(300)).await;

    let (view, attendees, loading) = store
        .state(|s| (s.view, s.summary.attendees.len(), s.summary.loading))
        .await;
    assert_eq!(view, View::Verify);
    assert_eq!(attendees, 0);
    assert!(loading.is_none());
    assert!(!store.is_running(SUMMARY_EFFECT));
}
