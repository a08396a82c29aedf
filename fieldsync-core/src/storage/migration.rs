// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Schema Migrations
//!
//! The event database schema is an ordered list of SQL steps. Applied steps
//! are recorded in `schema_version`; opening a database applies the missing
//! ones inside one exclusive transaction, so a failed upgrade leaves the
//! previous schema in place.

use chrono::Utc;
use rusqlite::{params, Connection, TransactionBehavior};
use tracing::info;

use super::StorageError;

/// One schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Strictly increasing, starting at 1.
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Every schema step, oldest first. Append only.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "offline_events",
        sql: "CREATE TABLE offline_events (
                local_id TEXT PRIMARY KEY NOT NULL,
                event_type TEXT NOT NULL,
                event_time TEXT NOT NULL,
                payload BLOB NOT NULL,
                created_at_local TEXT NOT NULL,
                synced INTEGER NOT NULL DEFAULT 0,
                retry_count INTEGER NOT NULL DEFAULT 0
            );",
    },
    Migration {
        version: 2,
        name: "unsynced_index",
        sql: "CREATE INDEX idx_offline_events_synced
                ON offline_events (synced, event_time);",
    },
];

const VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);";

/// Brings the event schema up to date and returns the resulting version.
pub fn migrate(conn: &mut Connection) -> Result<u32, StorageError> {
    apply(conn, MIGRATIONS)
}

/// Applies every step of `steps` newer than the recorded version.
pub fn apply(conn: &mut Connection, steps: &[Migration]) -> Result<u32, StorageError> {
    if let Some(pair) = steps.windows(2).find(|w| w[0].version >= w[1].version) {
        return Err(StorageError::Migration(format!(
            "v{} listed before v{}",
            pair[0].version, pair[1].version
        )));
    }

    // Dropping the transaction on any error rolls every step back
    let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;
    tx.execute_batch(VERSION_TABLE)?;

    let from = current_version(&tx)?;
    let mut version = from;
    for step in steps.iter().filter(|s| s.version > from) {
        tx.execute_batch(step.sql).map_err(|e| {
            StorageError::Migration(format!("v{} '{}': {}", step.version, step.name, e))
        })?;
        tx.execute(
            "INSERT INTO schema_version (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![step.version, step.name, Utc::now()],
        )?;
        info!(version = step.version, name = step.name, "schema migrated");
        version = step.version;
    }

    tx.commit()?;
    Ok(version)
}

/// Highest recorded version, 0 for a database never migrated.
pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    let tracked = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'")?
        .exists([])?;
    if !tracked {
        return Ok(0);
    }
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?)
}
