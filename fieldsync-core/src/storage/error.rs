//! Storage error and record types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage error types.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Corrupted value: {0}")]
    Corrupted(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Returns true if the durable store itself could not be opened, read or written.
    ///
    /// Callers use this to distinguish "the device cannot record anything right now"
    /// from a rejected input such as a malformed payload.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StorageError::Database(_)
                | StorageError::Io(_)
                | StorageError::Migration(_)
                | StorageError::LockPoisoned
        )
    }
}

/// Domain tag of a queued event.
///
/// The core never interprets the tag; it is stored and sent exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// Guard or cleaner attendance check-in/out.
    Attendance,
    /// Cleaning checklist completion.
    Checklist,
    /// Panic button signal.
    Panic,
    /// Periodic GPS ping.
    GpsPing,
    /// Any other tag understood by the server.
    Other(String),
}

impl EventType {
    /// Returns the wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Attendance => "attendance",
            EventType::Checklist => "checklist",
            EventType::Panic => "panic",
            EventType::GpsPing => "gps_ping",
            EventType::Other(tag) => tag,
        }
    }
}

impl From<&str> for EventType {
    fn from(tag: &str) -> Self {
        match tag {
            "attendance" => EventType::Attendance,
            "checklist" => EventType::Checklist,
            "panic" => EventType::Panic,
            "gps_ping" => EventType::GpsPing,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl From<String> for EventType {
    fn from(tag: String) -> Self {
        EventType::from(tag.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field-recorded event awaiting delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineEvent {
    /// Device-unique identifier, sent as `client_event_id`.
    pub local_id: String,
    pub event_type: EventType,
    /// When the action happened in the real world.
    pub event_time: DateTime<Utc>,
    /// Opaque JSON document, kept byte-for-byte.
    pub payload: Vec<u8>,
    /// When the event was durably stored.
    pub created_at_local: DateTime<Utc>,
    pub synced: bool,
    pub retry_count: u32,
}

/// Snapshot of the local queue for status displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Events still waiting for server confirmation.
    pub unsynced: usize,
    /// Confirmed events not yet removed by compaction.
    pub synced_awaiting_purge: usize,
    /// Unsynced events that failed at least one delivery attempt.
    pub failing: usize,
    /// Highest retry count among unsynced events.
    pub max_retry_count: u32,
    /// Occurrence time of the oldest unsynced event.
    pub oldest_unsynced_event_time: Option<DateTime<Utc>>,
}

impl QueueStats {
    /// Returns true if nothing is waiting for delivery.
    pub fn is_drained(&self) -> bool {
        self.unsynced == 0
    }
}
