// Tests for AlertPipeline
// Test cases:
// - Location timeout degrades the alert; one failed recipient does not affect the other
// - Fix is included in the message when available
// - Events are processed one at a time in arrival order
// - Recipients are the contact snapshot at submit time
// - Cancelling queued and in-flight events
// - Shutdown drains the queue and rejects new alerts
// - History keeps queued alerts past capacity, in arrival order
// - Cancelling an alert evicted from history reports AlreadyComplete
// - Concurrent submitters see history in channel order

use super::*;
use crate::alert::{AlertHistory, AlertState, DeliveryStatus};
use crate::config::Settings;
use crate::contacts::ContactBook;
use crate::dispatch::tests::{MockReply, MockTransport};
use crate::dispatch::NotificationDispatcher;
use crate::events::tests::MockEventEmitter;
use crate::listener::TriggerMatch;
use crate::location::{
    FixedLocationProvider, LocationError, LocationFix, LocationProvider, LocationResolver,
};
use crate::trigger::TriggerPhrase;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Location provider that answers after a delay, or never
struct DelayedLocation {
    delay: Option<Duration>,
}

#[async_trait]
impl LocationProvider for DelayedLocation {
    async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
        LocationFix::new(51.5074, -0.1278, Utc::now())
    }
}

struct Harness {
    handle: PipelineHandle,
    contacts: Arc<RwLock<ContactBook>>,
    transport: Arc<MockTransport>,
    emitter: Arc<MockEventEmitter>,
    history: Arc<AlertHistory>,
}

fn harness(provider: Arc<dyn LocationProvider>, transport: MockTransport) -> Harness {
    harness_with(&Settings::default(), provider, transport)
}

fn harness_with(
    settings: &Settings,
    provider: Arc<dyn LocationProvider>,
    transport: MockTransport,
) -> Harness {
    let contacts = Arc::new(RwLock::new(ContactBook::new()));
    let transport = Arc::new(transport);
    let emitter = Arc::new(MockEventEmitter::new());
    let history = Arc::new(AlertHistory::new(settings.history_capacity));

    let pipeline = AlertPipeline::new(
        LocationResolver::new(provider),
        NotificationDispatcher::new(transport.clone(), settings.send_timeout()),
        contacts.clone(),
        history.clone(),
        emitter.clone(),
        settings,
    );

    Harness {
        handle: pipeline.spawn(),
        contacts,
        transport,
        emitter,
        history,
    }
}

fn trigger(transcript: &str) -> TriggerMatch {
    TriggerMatch {
        phrase: TriggerPhrase::parse("help me").unwrap(),
        transcript: transcript.to_string(),
        is_final: true,
        detected_at: Utc::now(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_location_timeout_and_partial_delivery() {
    let h = harness(
        Arc::new(DelayedLocation { delay: None }),
        MockTransport::new().with_reply("5550000002", MockReply::Reject("no service".to_string())),
    );
    let a = h.contacts.write().add("A", "5550000001").unwrap();
    let b = h.contacts.write().add("B", "5550000002").unwrap();
    let started = tokio::time::Instant::now();

    let id = h.handle.submit(trigger("please Help Me now")).unwrap();
    h.handle.wait_idle().await;

    assert!(started.elapsed() >= Duration::from_secs(5));
    let event = h.history.get(&id).unwrap();
    assert_eq!(event.state, AlertState::Complete);
    assert!(event.location_fix.is_none());
    assert_eq!(event.location_error, Some(LocationError::Timeout(5000)));
    assert_eq!(event.status_of(&a.id), Some(&DeliveryStatus::Sent));
    assert!(matches!(
        event.status_of(&b.id),
        Some(DeliveryStatus::Failed { .. })
    ));
    assert_eq!(
        event.message.as_deref(),
        Some("Emergency! My location is: unavailable (no location fix)")
    );
    assert_eq!(
        h.emitter.states_for(&id),
        vec![
            AlertState::AwaitingLocation,
            AlertState::Dispatching,
            AlertState::Complete
        ]
    );
    assert_eq!(h.emitter.delivery_events.lock().unwrap().len(), 2);
    assert_eq!(h.handle.state(), PipelineState::Idle);
}

#[tokio::test]
async fn test_fix_is_included_in_message() {
    let h = harness(
        Arc::new(FixedLocationProvider::new(40.7128, -74.006)),
        MockTransport::new(),
    );
    h.contacts.write().add("A", "5550000001").unwrap();

    let id = h.handle.submit(trigger("help me")).unwrap();
    h.handle.wait_idle().await;

    let event = h.history.get(&id).unwrap();
    assert!(event.location_fix.is_some());
    assert!(event.location_error.is_none());
    let sent = h.transport.sent.lock().clone();
    assert_eq!(
        sent,
        vec![(
            "5550000001".to_string(),
            "Emergency! My location is: Latitude: 40.712800, Longitude: -74.006000".to_string()
        )]
    );
    let completed = h.emitter.completed_events.lock().unwrap();
    assert!(completed[0].has_location);
    assert_eq!(completed[0].summary.sent, 1);
}

#[tokio::test(start_paused = true)]
async fn test_events_are_serialized_in_arrival_order() {
    let h = harness(
        Arc::new(DelayedLocation {
            delay: Some(Duration::from_millis(100)),
        }),
        MockTransport::new().with_reply("5550000001", MockReply::Delayed(Duration::from_secs(1))),
    );
    h.contacts.write().add("A", "5550000001").unwrap();

    let first = h.handle.submit(trigger("help me 1")).unwrap();
    let second = h.handle.submit(trigger("help me 2")).unwrap();
    let third = h.handle.submit(trigger("help me 3")).unwrap();
    assert_eq!(h.handle.pending(), 3);
    h.handle.wait_idle().await;

    assert_eq!(
        h.emitter.completion_order(),
        vec![first.clone(), second.clone(), third.clone()]
    );

    let positions: Vec<usize> = h
        .emitter
        .created_events
        .lock()
        .unwrap()
        .iter()
        .map(|p| p.queue_position)
        .collect();
    assert_eq!(positions, vec![0, 1, 2]);

    // No event leaves Complete before the next one starts
    let states: Vec<(String, AlertState)> = h
        .emitter
        .state_events
        .lock()
        .unwrap()
        .iter()
        .map(|p| (p.alert_id.clone(), p.state))
        .collect();
    let mut in_flight: Option<String> = None;
    for (id, state) in states {
        match state {
            AlertState::AwaitingLocation => {
                assert!(in_flight.is_none(), "{} started while another was in flight", id);
                in_flight = Some(id);
            }
            AlertState::Complete => {
                assert_eq!(in_flight.take(), Some(id));
            }
            _ => assert_eq!(in_flight.as_ref(), Some(&id)),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_recipients_are_snapshotted_at_submit() {
    let h = harness(
        Arc::new(DelayedLocation {
            delay: Some(Duration::from_secs(1)),
        }),
        MockTransport::new(),
    );
    let a = h.contacts.write().add("A", "5550000001").unwrap();

    let first = h.handle.submit(trigger("help me")).unwrap();
    let b = h.contacts.write().add("B", "5550000002").unwrap();
    let second = h.handle.submit(trigger("help me")).unwrap();
    h.contacts.write().remove(&a.id).unwrap();
    h.handle.wait_idle().await;

    let first = h.history.get(&first).unwrap();
    let second = h.history.get(&second).unwrap();
    assert_eq!(first.recipients(), &[a.clone()]);
    assert_eq!(second.recipients(), &[a.clone(), b.clone()]);
    assert_eq!(second.status_of(&a.id), Some(&DeliveryStatus::Sent));
    assert_eq!(h.transport.sent.lock().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_queued_event_skips_location_and_dispatch() {
    let h = harness(
        Arc::new(DelayedLocation {
            delay: Some(Duration::from_secs(10)),
        }),
        MockTransport::new(),
    );
    let a = h.contacts.write().add("A", "5550000001").unwrap();

    let first = h.handle.submit(trigger("help me")).unwrap();
    let second = h.handle.submit(trigger("help me")).unwrap();
    h.handle.cancel(&second).unwrap();
    h.handle.wait_idle().await;

    let second_event = h.history.get(&second).unwrap();
    assert!(second_event.cancelled);
    assert!(second_event.is_complete());
    assert_eq!(second_event.status_of(&a.id), Some(&DeliveryStatus::Cancelled));
    assert!(second_event.location_error.is_none());
    assert_eq!(h.emitter.states_for(&second), vec![AlertState::Complete]);

    let first_event = h.history.get(&first).unwrap();
    assert_eq!(first_event.status_of(&a.id), Some(&DeliveryStatus::Sent));
    assert_eq!(h.transport.sent_to(), vec!["5550000001"]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_current_while_awaiting_location() {
    let h = harness(Arc::new(DelayedLocation { delay: None }), MockTransport::new());
    let a = h.contacts.write().add("A", "5550000001").unwrap();

    let id = h.handle.submit(trigger("help me")).unwrap();
    let mut state_rx = h.handle.subscribe_state();
    state_rx
        .wait_for(|state| *state == PipelineState::AwaitingLocation)
        .await
        .unwrap();
    assert_eq!(h.handle.current(), Some(id.clone()));

    assert_eq!(h.handle.cancel_current(), Some(id.clone()));
    h.handle.wait_idle().await;

    let event = h.history.get(&id).unwrap();
    assert!(event.cancelled);
    assert_eq!(event.status_of(&a.id), Some(&DeliveryStatus::Cancelled));
    assert!(h.transport.sent_to().is_empty());
    assert!(h.emitter.completed_events.lock().unwrap()[0].cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_dispatch_keeps_sent() {
    let h = harness(
        Arc::new(FixedLocationProvider::new(1.0, 1.0)),
        MockTransport::new().with_reply("5550000002", MockReply::Delayed(Duration::from_secs(60))),
    );
    let a = h.contacts.write().add("A", "5550000001").unwrap();
    let b = h.contacts.write().add("B", "5550000002").unwrap();

    let id = h.handle.submit(trigger("help me")).unwrap();
    let mut state_rx = h.handle.subscribe_state();
    state_rx
        .wait_for(|state| *state == PipelineState::Dispatching)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.handle.cancel(&id).unwrap();
    h.handle.wait_idle().await;

    let event = h.history.get(&id).unwrap();
    assert_eq!(event.status_of(&a.id), Some(&DeliveryStatus::Sent));
    assert_eq!(event.status_of(&b.id), Some(&DeliveryStatus::Cancelled));
    assert!(event.cancelled);
}

#[tokio::test]
async fn test_cancel_unknown_and_completed() {
    let h = harness(Arc::new(FixedLocationProvider::new(1.0, 1.0)), MockTransport::new());

    assert_eq!(
        h.handle.cancel(&"nope".to_string()),
        Err(PipelineError::UnknownAlert("nope".to_string()))
    );

    let id = h.handle.submit(trigger("help me")).unwrap();
    h.handle.wait_idle().await;

    assert_eq!(
        h.handle.cancel(&id),
        Err(PipelineError::AlreadyComplete(id.clone()))
    );
    assert_eq!(h.handle.cancel_current(), None);
}

#[tokio::test]
async fn test_no_recipients_completes_immediately() {
    let h = harness(Arc::new(FixedLocationProvider::new(1.0, 1.0)), MockTransport::new());

    let id = h.handle.submit(trigger("help me")).unwrap();
    h.handle.wait_idle().await;

    let event = h.history.get(&id).unwrap();
    assert!(event.is_complete());
    assert!(event.per_recipient_status().is_empty());
    assert!(h.transport.sent_to().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_queue_and_rejects_new_alerts() {
    let h = harness(
        Arc::new(DelayedLocation {
            delay: Some(Duration::from_secs(1)),
        }),
        MockTransport::new(),
    );
    h.contacts.write().add("A", "5550000001").unwrap();

    let first = h.handle.submit(trigger("help me")).unwrap();
    let second = h.handle.submit(trigger("help me")).unwrap();
    h.handle.shutdown().await;

    assert!(h.history.get(&first).unwrap().is_complete());
    assert!(h.history.get(&second).unwrap().is_complete());
    assert_eq!(
        h.handle.submit(trigger("help me")),
        Err(PipelineError::ShutDown)
    );
    assert_eq!(h.handle.pending(), 0);
}

fn recent_ids(history: &AlertHistory) -> Vec<String> {
    history.recent().into_iter().map(|e| e.id).collect()
}

#[tokio::test(start_paused = true)]
async fn test_history_keeps_queued_alerts_in_order() {
    let settings = Settings {
        history_capacity: 2,
        ..Settings::default()
    };
    let h = harness_with(
        &settings,
        Arc::new(DelayedLocation {
            delay: Some(Duration::from_secs(1)),
        }),
        MockTransport::new(),
    );

    let a = h.handle.submit(trigger("help me")).unwrap();
    let b = h.handle.submit(trigger("help me")).unwrap();
    let c = h.handle.submit(trigger("help me")).unwrap();

    let mut state_rx = h.handle.subscribe_state();
    state_rx
        .wait_for(|state| *state == PipelineState::AwaitingLocation)
        .await
        .unwrap();

    assert_eq!(recent_ids(&h.history), vec![c.clone(), b.clone(), a.clone()]);
    assert_eq!(h.history.get(&b).unwrap().state, AlertState::Queued);

    h.handle.wait_idle().await;

    assert_eq!(recent_ids(&h.history), vec![c.clone(), b.clone()]);
    assert!(h.history.get(&c).unwrap().is_complete());
}

#[tokio::test]
async fn test_cancel_evicted_alert_reports_already_complete() {
    let settings = Settings {
        history_capacity: 1,
        ..Settings::default()
    };
    let h = harness_with(
        &settings,
        Arc::new(FixedLocationProvider::new(1.0, 1.0)),
        MockTransport::new(),
    );

    let first = h.handle.submit(trigger("help me")).unwrap();
    let second = h.handle.submit(trigger("help me")).unwrap();
    h.handle.wait_idle().await;

    assert!(h.history.get(&first).is_none());
    assert_eq!(
        h.handle.cancel(&first),
        Err(PipelineError::AlreadyComplete(first.clone()))
    );
    assert_eq!(
        h.handle.cancel(&second),
        Err(PipelineError::AlreadyComplete(second.clone()))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submitters_keep_history_in_channel_order() {
    let settings = Settings {
        history_capacity: 200,
        ..Settings::default()
    };
    let h = harness_with(
        &settings,
        Arc::new(FixedLocationProvider::new(1.0, 1.0)),
        MockTransport::new(),
    );
    let handle = Arc::new(h.handle);

    let submitters: Vec<_> = (0..8)
        .map(|_| {
            let handle = handle.clone();
            tokio::spawn(async move {
                for _ in 0..10 {
                    handle.submit(trigger("help me")).unwrap();
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for submitter in submitters {
        submitter.await.unwrap();
    }
    handle.wait_idle().await;

    // Worker order is channel order
    let processed = h.emitter.completion_order();
    assert_eq!(processed.len(), 80);

    let created: Vec<String> = h
        .emitter
        .created_events
        .lock()
        .unwrap()
        .iter()
        .map(|p| p.alert_id.clone())
        .collect();
    assert_eq!(created, processed);

    let mut history_order = recent_ids(&h.history);
    history_order.reverse();
    assert_eq!(history_order, processed);
}
