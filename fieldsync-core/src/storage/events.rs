// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Offline event queue operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde_json::value::RawValue;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{EventType, OfflineEvent, QueueStats};
use super::{Storage, StorageError};

const EVENT_COLUMNS: &str =
    "local_id, event_type, event_time, payload, created_at_local, synced, retry_count";

impl Storage {
    // === Queue Operations ===

    /// Durably queues a new event and returns its local id.
    ///
    /// The row is committed before this returns. The payload must be a JSON
    /// document; it is stored and later sent without re-encoding.
    pub fn enqueue(
        &self,
        event_type: &EventType,
        event_time: DateTime<Utc>,
        payload: &[u8],
    ) -> Result<String, StorageError> {
        validate_payload(payload)?;

        let local_id = new_local_id();
        let created_at_local = Utc::now();

        self.lock()?.execute(
            "INSERT INTO offline_events
             (local_id, event_type, event_time, payload, created_at_local, synced, retry_count)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 0)",
            params![
                local_id,
                event_type.as_str(),
                event_time,
                payload,
                created_at_local,
            ],
        )?;

        debug!(local_id = %local_id, event_type = %event_type, "event queued");
        Ok(local_id)
    }

    /// Returns every event not yet confirmed by the server, in no particular order.
    pub fn list_unsynced(&self) -> Result<Vec<OfflineEvent>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM offline_events WHERE synced = 0"
        ))?;

        let rows = stmt.query_map([], row_to_event)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::Database)
    }

    /// Gets a single event by local id.
    pub fn get_event(&self, local_id: &str) -> Result<Option<OfflineEvent>, StorageError> {
        let event = self
            .lock()?
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM offline_events WHERE local_id = ?1"),
                params![local_id],
                row_to_event,
            )
            .optional()?;
        Ok(event)
    }

    /// Marks an event as confirmed by the server.
    ///
    /// Returns false if the id is unknown.
    pub fn mark_synced(&self, local_id: &str) -> Result<bool, StorageError> {
        let rows_affected = self.lock()?.execute(
            "UPDATE offline_events SET synced = 1 WHERE local_id = ?1",
            params![local_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Records one failed delivery attempt for an event.
    ///
    /// Returns false if the id is unknown.
    pub fn increment_retry(&self, local_id: &str) -> Result<bool, StorageError> {
        let rows_affected = self.lock()?.execute(
            "UPDATE offline_events SET retry_count = retry_count + 1 WHERE local_id = ?1",
            params![local_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Permanently removes an event.
    ///
    /// Returns false if the id is unknown.
    pub fn delete(&self, local_id: &str) -> Result<bool, StorageError> {
        let rows_affected = self.lock()?.execute(
            "DELETE FROM offline_events WHERE local_id = ?1",
            params![local_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Deletes every event already confirmed by the server.
    ///
    /// Returns the number of deleted events.
    pub fn purge_synced(&self) -> Result<usize, StorageError> {
        let rows_affected = self
            .lock()?
            .execute("DELETE FROM offline_events WHERE synced = 1", [])?;
        if rows_affected > 0 {
            info!(purged = rows_affected, "compacted synced events");
        }
        Ok(rows_affected)
    }

    /// Counts events awaiting delivery.
    pub fn count_unsynced(&self) -> Result<usize, StorageError> {
        let count: i64 = self.lock()?.query_row(
            "SELECT COUNT(*) FROM offline_events WHERE synced = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Counts all stored events, synced or not.
    pub fn count_events(&self) -> Result<usize, StorageError> {
        let count: i64 =
            self.lock()?
                .query_row("SELECT COUNT(*) FROM offline_events", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Summarises the queue for "saved offline, will sync later" displays.
    pub fn queue_stats(&self) -> Result<QueueStats, StorageError> {
        let stats = self.lock()?.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN synced = 0 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN synced = 1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN synced = 0 AND retry_count > 0 THEN 1 ELSE 0 END), 0),
                COALESCE(MAX(CASE WHEN synced = 0 THEN retry_count END), 0),
                MIN(CASE WHEN synced = 0 THEN event_time END)
             FROM offline_events",
            [],
            |row| {
                Ok(QueueStats {
                    unsynced: row.get::<_, i64>(0)? as usize,
                    synced_awaiting_purge: row.get::<_, i64>(1)? as usize,
                    failing: row.get::<_, i64>(2)? as usize,
                    max_retry_count: row.get::<_, i64>(3)? as u32,
                    oldest_unsynced_event_time: row.get(4)?,
                })
            },
        )?;
        Ok(stats)
    }
}

/// Generates a collision-resistant local id: millisecond timestamp prefix
/// followed by random bits (UUIDv7).
fn new_local_id() -> String {
    Uuid::now_v7().to_string()
}

fn validate_payload(payload: &[u8]) -> Result<(), StorageError> {
    serde_json::from_slice::<&RawValue>(payload)
        .map(|_| ())
        .map_err(|e| StorageError::InvalidPayload(e.to_string()))
}

/// Converts database row to OfflineEvent.
fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<OfflineEvent> {
    Ok(OfflineEvent {
        local_id: row.get(0)?,
        event_type: EventType::from(row.get::<_, String>(1)?),
        event_time: row.get(2)?,
        payload: row.get(3)?,
        created_at_local: row.get(4)?,
        synced: row.get(5)?,
        retry_count: row.get::<_, i64>(6)? as u32,
    })
}
