//! Restart Workflow Integration Tests
//!
//! The app is killed between recording and syncing; nothing recorded may
//! be lost and the device keeps its identity.

use std::sync::Arc;

use fieldsync_core::{
    ConnectivityFlag, EventType, FieldSync, FieldSyncConfig, MockReply, MockTransport,
};
use tempfile::TempDir;

use crate::common::{at, init_tracing};

fn open_app(dir: &TempDir, transport: Arc<MockTransport>, online: bool) -> FieldSync {
    init_tracing();
    FieldSync::builder()
        .config(FieldSyncConfig::with_data_dir(dir.path()))
        .transport(transport)
        .connectivity(Arc::new(ConnectivityFlag::new(online)))
        .build()
        .unwrap()
}

/// Test: events recorded before a restart are sent after it
#[test]
fn test_events_recorded_before_restart_are_synced_after() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());

    let (device_id, ids) = {
        let app = open_app(&dir, transport.clone(), false);
        let ids: Vec<String> = (0..3)
            .map(|i| {
                app.record(&EventType::GpsPing, at(i), br#"{"battery":80}"#)
                    .unwrap()
                    .local_id()
                    .to_string()
            })
            .collect();
        (app.device_id().unwrap(), ids)
    };

    let app = open_app(&dir, transport.clone(), true);
    assert_eq!(app.device_id().unwrap(), device_id);
    assert_eq!(app.queue_stats().unwrap().unsynced, 3);

    let result = app.sync_now().unwrap().unwrap();
    assert_eq!(result.synced, 3);

    let upload = &transport.uploads()[0];
    assert_eq!(upload.device_id, device_id);
    assert_eq!(upload.event_ids, ids);
}

/// Test: a crash after upload but before reconciliation resends the same ids
#[test]
fn test_unconfirmed_upload_is_resent_with_same_ids() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(MockTransport::new());

    let id = {
        let app = open_app(&dir, transport.clone(), false);
        app.record(&EventType::Attendance, at(0), b"{}")
            .unwrap()
            .local_id()
            .to_string()
    };

    {
        // Server never answers: same situation as dying mid-request
        let app = open_app(&dir, transport.clone(), true);
        transport.push_reply(MockReply::Offline);
        assert!(app.sync_now().unwrap().is_none());
    }

    let app = open_app(&dir, transport.clone(), true);
    app.sync_now().unwrap().unwrap();

    let uploads = transport.uploads();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].event_ids, vec![id.clone()]);
    assert_eq!(uploads[1].event_ids, vec![id]);
    assert!(app.queue_stats().unwrap().is_drained());
}
