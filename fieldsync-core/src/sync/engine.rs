// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Engine
//!
//! Moves events from "locally recorded" to "server-confirmed".
//!
//! There is no persisted in-flight state: an event stays unsynced for the
//! whole round trip, so a crash mid-upload simply means it is sent again on
//! the next drain. The server deduplicates on `client_event_id`.

use std::collections::HashMap;
use std::sync::{Mutex, TryLockError};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::protocol::{BatchEvent, SyncBatch, SyncResponse};
use super::transport::{SyncTransport, TransportError};
use crate::config::SyncConfig;
use crate::context::SyncContext;
use crate::storage::{OfflineEvent, StorageError};

/// Sync errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Upload failed without a response; no event was modified.
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// Local storage or identity failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result of a drain.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncResult {
    /// Number of batches the server answered.
    pub batches: usize,
    /// Number of events sent.
    pub sent: usize,
    /// Number of events confirmed and marked synced.
    pub synced: usize,
    /// Number of events that failed and had their retry count bumped.
    pub failed: usize,
    /// Sum of `synced_count` as reported by the server.
    pub server_synced_count: u64,
    /// Number of confirmed events removed by compaction.
    pub purged: usize,
    /// Per-event errors as (local id, reason).
    pub errors: Vec<(String, String)>,
}

/// Drains the event store through a transport.
pub struct SyncEngine<T: SyncTransport> {
    context: SyncContext,
    transport: T,
    config: SyncConfig,
    /// Held for a whole drain or immediate upload so no event is sent by two paths at once.
    drain_lock: Mutex<()>,
}

impl<T: SyncTransport> SyncEngine<T> {
    /// Creates a new SyncEngine.
    pub fn new(context: SyncContext, transport: T, config: SyncConfig) -> Self {
        SyncEngine {
            context,
            transport,
            config,
            drain_lock: Mutex::new(()),
        }
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Uploads every unsynced event and reconciles the per-event outcome.
    ///
    /// Events are sent oldest `event_time` first, in batches of at most
    /// `batch_size`. Rejected events get their retry count bumped and stay
    /// queued; all others are marked synced. A transport failure leaves the
    /// failed batch and every later batch untouched and returns
    /// [`SyncError::Network`]; batches answered before it stay reconciled.
    pub fn drain_and_sync(&self) -> Result<SyncResult, SyncError> {
        let _drain = self
            .drain_lock
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;

        let storage = self.context.storage();
        let mut result = SyncResult::default();

        let mut events = storage.list_unsynced()?;
        if !events.is_empty() {
            events.sort_by(|a, b| {
                a.event_time
                    .cmp(&b.event_time)
                    .then_with(|| a.local_id.cmp(&b.local_id))
            });

            let device_id = self.context.identity().device_id()?;

            for chunk in events.chunks(self.config.effective_batch_size()) {
                let batch = self.build_batch(&device_id, chunk, &mut result)?;
                if batch.is_empty() {
                    continue;
                }

                let response = match self.transport.upload(&batch) {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(
                            error = %e,
                            batch_events = batch.len(),
                            synced_so_far = result.synced,
                            "sync upload failed, events stay queued"
                        );
                        return Err(SyncError::Network(e));
                    }
                };

                result.batches += 1;
                result.sent += batch.len();
                self.reconcile(&batch, &response, &mut result)?;
            }
        }

        if self.config.compact_after_sync {
            result.purged = storage.purge_synced()?;
        }

        info!(
            sent = result.sent,
            synced = result.synced,
            failed = result.failed,
            purged = result.purged,
            "sync drain finished"
        );
        Ok(result)
    }

    /// Best-effort delivery of one already-queued event.
    ///
    /// On success the event is marked synced. Any failure is swallowed and the
    /// event is left exactly as it was; the next drain retries it. While a
    /// drain is running nothing is sent: that drain, or the next one, carries
    /// the event.
    pub fn try_sync_immediate(&self, local_id: &str) -> bool {
        match self.sync_single(local_id) {
            Ok(delivered) => delivered,
            Err(e) => {
                debug!(local_id, error = %e, "immediate sync failed, left queued");
                false
            }
        }
    }

    fn sync_single(&self, local_id: &str) -> Result<bool, SyncError> {
        // A running drain may already hold this event in a listed batch
        let _drain = match self.drain_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                debug!(local_id, "drain in progress, immediate sync skipped");
                return Ok(false);
            }
            Err(TryLockError::Poisoned(_)) => return Err(StorageError::LockPoisoned.into()),
        };

        let storage = self.context.storage();
        let Some(event) = storage.get_event(local_id)? else {
            return Ok(false);
        };
        if event.synced {
            return Ok(true);
        }

        let wire = match BatchEvent::from_event(&event, &self.config.client_version) {
            Ok(wire) => wire,
            Err(e) => {
                debug!(local_id, error = %e, "stored payload is not valid JSON");
                return Ok(false);
            }
        };
        let batch = SyncBatch {
            device_id: self.context.identity().device_id()?,
            device_time_at_send: Utc::now(),
            events: vec![wire],
        };

        let response = self.transport.upload(&batch)?;
        if let Some(rejection) = response
            .errors
            .iter()
            .find(|e| e.client_event_id == local_id)
        {
            debug!(local_id, error = %rejection.error, "server rejected immediate event");
            return Ok(false);
        }

        storage.mark_synced(local_id)?;
        debug!(local_id, "event delivered immediately");
        Ok(true)
    }

    /// Builds the wire batch for a chunk of events.
    ///
    /// An event whose stored payload is no longer valid JSON cannot be sent;
    /// it counts as a failed attempt for that event alone.
    fn build_batch(
        &self,
        device_id: &str,
        events: &[OfflineEvent],
        result: &mut SyncResult,
    ) -> Result<SyncBatch, StorageError> {
        let mut wire_events = Vec::with_capacity(events.len());
        for event in events {
            match BatchEvent::from_event(event, &self.config.client_version) {
                Ok(wire) => wire_events.push(wire),
                Err(e) => {
                    warn!(local_id = %event.local_id, error = %e, "skipping event with corrupt payload");
                    self.context.storage().increment_retry(&event.local_id)?;
                    result.failed += 1;
                    result
                        .errors
                        .push((event.local_id.clone(), format!("corrupt payload: {e}")));
                }
            }
        }

        Ok(SyncBatch {
            device_id: device_id.to_string(),
            device_time_at_send: Utc::now(),
            events: wire_events,
        })
    }

    /// Applies the server's per-event outcome to the store.
    fn reconcile(
        &self,
        batch: &SyncBatch,
        response: &SyncResponse,
        result: &mut SyncResult,
    ) -> Result<(), StorageError> {
        let storage = self.context.storage();
        let rejected: HashMap<&str, &str> = response
            .errors
            .iter()
            .map(|e| (e.client_event_id.as_str(), e.error.as_str()))
            .collect();

        let mut accepted = 0u64;
        for event in &batch.events {
            let id = event.client_event_id.as_str();
            match rejected.get(id) {
                Some(reason) => {
                    storage.increment_retry(id)?;
                    result.failed += 1;
                    result.errors.push((id.to_string(), reason.to_string()));
                }
                None => {
                    storage.mark_synced(id)?;
                    result.synced += 1;
                    accepted += 1;
                }
            }
        }

        let sent_ids = batch.event_ids();
        for id in rejected.keys().filter(|id| !sent_ids.contains(*id)) {
            warn!(client_event_id = %id, "server reported error for an event not in the batch");
        }
        if response.synced_count != accepted {
            warn!(
                reported = response.synced_count,
                reconciled = accepted,
                "server synced_count disagrees with per-event outcome"
            );
        }

        result.server_synced_count += response.synced_count;
        Ok(())
    }
}
