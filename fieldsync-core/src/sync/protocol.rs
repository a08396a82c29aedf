// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Upload Wire Format
//!
//! JSON bodies exchanged with the server's batch endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::storage::{EventType, OfflineEvent};

/// Client version reported with every event unless configured otherwise.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A batch of queued events submitted in one request.
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncBatch {
    pub device_id: String,
    pub device_time_at_send: DateTime<Utc>,
    pub events: Vec<BatchEvent>,
}

impl SyncBatch {
    /// Ids of the events in this batch, in send order.
    pub fn event_ids(&self) -> Vec<&str> {
        self.events
            .iter()
            .map(|e| e.client_event_id.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// One queued event on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchEvent {
    /// The event's local id; the server deduplicates on it.
    pub client_event_id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub event_time: DateTime<Utc>,
    /// Producer payload embedded verbatim.
    pub payload: Box<RawValue>,
    pub client_version: String,
}

impl BatchEvent {
    /// Builds the wire form of a stored event.
    ///
    /// Fails if the stored payload is no longer a JSON document.
    pub fn from_event(
        event: &OfflineEvent,
        client_version: &str,
    ) -> Result<Self, serde_json::Error> {
        let payload: Box<RawValue> = serde_json::from_slice::<&RawValue>(&event.payload)?.to_owned();
        Ok(BatchEvent {
            client_event_id: event.local_id.clone(),
            event_type: event.event_type.clone(),
            event_time: event.event_time,
            payload,
            client_version: client_version.to_string(),
        })
    }
}

/// Server answer to a batch upload.
///
/// Every event of the batch not listed in `errors` counts as synced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub synced_count: u64,
    #[serde(default)]
    pub errors: Vec<EventError>,
}

impl SyncResponse {
    /// Response accepting every event of the batch.
    pub fn accept_all(batch: &SyncBatch) -> Self {
        SyncResponse {
            synced_count: batch.len() as u64,
            errors: Vec::new(),
        }
    }
}

/// A per-event rejection reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventError {
    pub client_event_id: String,
    pub error: String,
}

impl EventError {
    pub fn new(client_event_id: impl Into<String>, error: impl Into<String>) -> Self {
        EventError {
            client_event_id: client_event_id.into(),
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(payload: &[u8]) -> OfflineEvent {
        OfflineEvent {
            local_id: "0190b2c4-0000-7000-8000-000000000001".into(),
            event_type: EventType::Checklist,
            event_time: Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap(),
            payload: payload.to_vec(),
            created_at_local: Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 1).unwrap(),
            synced: false,
            retry_count: 0,
        }
    }

    #[test]
    fn test_batch_serializes_wire_field_names() {
        let batch = SyncBatch {
            device_id: "dev-1".into(),
            device_time_at_send: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            events: vec![BatchEvent::from_event(&event(br#"{"items":[1,2]}"#), "1.2.0").unwrap()],
        };

        let json: serde_json::Value = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["device_id"], "dev-1");
        assert_eq!(json["device_time_at_send"], "2026-03-01T09:00:00Z");

        let wire_event = &json["events"][0];
        assert_eq!(
            wire_event["client_event_id"],
            "0190b2c4-0000-7000-8000-000000000001"
        );
        assert_eq!(wire_event["type"], "checklist");
        assert_eq!(wire_event["event_time"], "2026-03-01T08:30:00Z");
        assert_eq!(wire_event["payload"]["items"][1], 2);
        assert_eq!(wire_event["client_version"], "1.2.0");
    }

    #[test]
    fn test_payload_is_embedded_verbatim() {
        let raw = br#"{ "b": 1,  "a": [true, null] }"#;
        let wire = BatchEvent::from_event(&event(raw), CLIENT_VERSION).unwrap();
        let body = serde_json::to_string(&wire).unwrap();
        assert!(body.contains(r#""payload":{ "b": 1,  "a": [true, null] }"#));
    }

    #[test]
    fn test_corrupt_payload_is_rejected() {
        assert!(BatchEvent::from_event(&event(b"\xff"), CLIENT_VERSION).is_err());
    }

    #[test]
    fn test_response_errors_default_to_empty() {
        let response: SyncResponse = serde_json::from_str(r#"{"synced_count": 3}"#).unwrap();
        assert_eq!(response.synced_count, 3);
        assert!(response.errors.is_empty());
    }

    #[test]
    fn test_response_with_errors() {
        let response: SyncResponse = serde_json::from_str(
            r#"{"synced_count": 1, "errors": [{"client_event_id": "x", "error": "invalid zone"}]}"#,
        )
        .unwrap();
        assert_eq!(response.errors, vec![EventError::new("x", "invalid zone")]);
    }

    #[test]
    fn test_unknown_event_type_round_trips() {
        let json = serde_json::to_string(&EventType::from("visitor_log")).unwrap();
        assert_eq!(json, r#""visitor_log""#);
        let back: EventType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EventType::Other("visitor_log".into()));
    }
}
