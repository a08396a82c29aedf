//! Offline Workflow Integration Tests
//!
//! A guard records events with no network, connectivity returns, the
//! queue drains.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use fieldsync_core::{
    CallbackHandler, ConnectivityFlag, EventType, FieldSync, FieldSyncEvent, MockReply,
    MockTransport, RawFix, RecordOutcome, StaticLocationProvider, SyncContext, Zone,
};

use crate::common::{at, init_tracing};

fn field_app(
    transport: Arc<MockTransport>,
    online: Arc<ConnectivityFlag>,
) -> (FieldSync, Arc<Mutex<Vec<FieldSyncEvent>>>) {
    init_tracing();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let fs = FieldSync::builder()
        .context(SyncContext::in_memory().unwrap())
        .transport(transport)
        .connectivity(online)
        .location_provider(Arc::new(StaticLocationProvider::new(RawFix::new(
            -6.2001, 106.8166, 9.0,
        ))))
        .event_handler(Arc::new(CallbackHandler::new(move |e| {
            sink.lock().unwrap().push(e.clone())
        })))
        .build()
        .unwrap();
    (fs, seen)
}

/// Test: events recorded offline are delivered and compacted after reconnect
#[test]
fn test_offline_then_online_drain() {
    let transport = Arc::new(MockTransport::new());
    let online = Arc::new(ConnectivityFlag::new(false));
    let (fs, seen) = field_app(transport.clone(), online.clone());

    let a = fs
        .record(&EventType::Attendance, at(0), br#"{"action":"check_in"}"#)
        .unwrap();
    let b = fs
        .record(&EventType::Checklist, at(15), br#"{"items_done":7}"#)
        .unwrap();
    assert!(matches!(a, RecordOutcome::SavedOffline { .. }));
    assert!(matches!(b, RecordOutcome::SavedOffline { .. }));
    assert_eq!(fs.queue_stats().unwrap().unsynced, 2);
    assert_eq!(transport.upload_count(), 0);

    online.set_online(true);
    let result = fs.sync_now().unwrap().unwrap();

    assert_eq!(result.synced, 2);
    assert_eq!(result.purged, 2);
    let storage = fs.context().storage();
    assert!(storage.list_unsynced().unwrap().is_empty());
    assert_eq!(storage.count_events().unwrap(), 0);

    let uploaded = &transport.uploads()[0].event_ids;
    assert_eq!(uploaded, &vec![a.local_id().to_string(), b.local_id().to_string()]);

    assert!(matches!(
        seen.lock().unwrap().last(),
        Some(FieldSyncEvent::SyncCompleted { synced: 2, failed: 0, purged: 2 })
    ));
}

/// Test: an outage during the drain changes nothing
#[test]
fn test_outage_during_drain_changes_nothing() {
    let transport = Arc::new(MockTransport::new());
    let online = Arc::new(ConnectivityFlag::new(false));
    let (fs, _) = field_app(transport.clone(), online.clone());

    for i in 0..3 {
        fs.record(&EventType::GpsPing, at(i), b"{}").unwrap();
    }
    let mut before = fs.context().storage().list_unsynced().unwrap();

    online.set_online(true);
    transport.set_default(MockReply::Offline);
    assert_eq!(fs.sync_now().unwrap(), None);

    let mut after = fs.context().storage().list_unsynced().unwrap();
    before.sort_by(|x, y| x.local_id.cmp(&y.local_id));
    after.sort_by(|x, y| x.local_id.cmp(&y.local_id));
    assert_eq!(before, after);
    assert!(after.iter().all(|e| e.retry_count == 0));
}

/// Test: a panic signal with location context goes out immediately when online
#[test]
fn test_panic_with_location_online() {
    let transport = Arc::new(MockTransport::new());
    let (fs, seen) = field_app(transport.clone(), Arc::new(ConnectivityFlag::new(true)));

    let sample = fs.capture_location().unwrap();
    assert!(!sample.mock_location);

    let zone = Zone::new(-6.2, 106.8166, 50.0).with_name("Main gate");
    let check = fs.check_zone(&sample, &zone);
    assert!(check.within);

    let payload = serde_json::to_vec(&serde_json::json!({
        "location": sample,
        "zone_distance_m": check.distance_meters,
    }))
    .unwrap();
    let outcome = fs.record(&EventType::Panic, Utc::now(), &payload).unwrap();

    assert!(outcome.is_delivered());
    let body: serde_json::Value =
        serde_json::from_str(&transport.uploads()[0].body).unwrap();
    assert_eq!(body["events"][0]["payload"]["location"]["mock_location"], false);
    assert!(seen
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, FieldSyncEvent::EventDelivered { .. })));
}

/// Test: one rejected event stays queued with a retry count while others clear
#[test]
fn test_rejected_event_stays_visible_in_stats() {
    let transport = Arc::new(MockTransport::new());
    let online = Arc::new(ConnectivityFlag::new(false));
    let (fs, _) = field_app(transport.clone(), online.clone());

    let bad = fs.record(&EventType::Checklist, at(0), b"{}").unwrap();
    fs.record(&EventType::Checklist, at(1), b"{}").unwrap();

    online.set_online(true);
    transport.push_reply(MockReply::Reject(vec![fieldsync_core::sync::EventError::new(
        bad.local_id(),
        "unknown zone",
    )]));
    let result = fs.sync_now().unwrap().unwrap();
    assert_eq!(result.failed, 1);

    let stats = fs.queue_stats().unwrap();
    assert_eq!(stats.unsynced, 1);
    assert_eq!(stats.failing, 1);
    assert_eq!(stats.max_retry_count, 1);
    assert_eq!(stats.oldest_unsynced_event_time, Some(at(0)));
}
