//! Transport Trait
//!
//! Boundary between the sync engine and the server's batch endpoint.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::protocol::{EventError, SyncBatch, SyncResponse};

/// Transport-level failures. None of them is attributable to a single event.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request could not be completed (DNS, connect, timeout, reset).
    #[error("request failed: {0}")]
    Request(String),

    /// Server answered with a non-success status.
    #[error("HTTP error: {0}")]
    Http(u16),

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// No network path available.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Uploads sync batches.
///
/// Blocking interface; platform shells may run it on their own executor.
/// An `Ok` response means the server processed the batch, possibly with
/// per-event errors. An `Err` means nothing can be concluded about any event.
pub trait SyncTransport: Send + Sync {
    fn upload(&self, batch: &SyncBatch) -> TransportResult<SyncResponse>;
}

impl<T: SyncTransport + ?Sized> SyncTransport for Arc<T> {
    fn upload(&self, batch: &SyncBatch) -> TransportResult<SyncResponse> {
        (**self).upload(batch)
    }
}

impl<T: SyncTransport + ?Sized> SyncTransport for Box<T> {
    fn upload(&self, batch: &SyncBatch) -> TransportResult<SyncResponse> {
        (**self).upload(batch)
    }
}

/// Scripted reply used by [`MockTransport`].
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Accept every event of the batch.
    AcceptAll,
    /// Reject the listed ids, accept the rest.
    Reject(Vec<EventError>),
    /// Return exactly this response.
    Respond(SyncResponse),
    /// Fail at the transport level.
    Offline,
}

/// Recorded copy of an uploaded batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBatch {
    pub device_id: String,
    pub event_ids: Vec<String>,
    /// The JSON body as it would go over the wire.
    pub body: String,
}

/// Mock transport for testing.
///
/// Replies are consumed in order; once the script is exhausted the default
/// reply is used for every further upload.
pub struct MockTransport {
    script: Mutex<VecDeque<MockReply>>,
    default_reply: Mutex<MockReply>,
    uploads: Mutex<Vec<RecordedBatch>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a transport that accepts everything.
    pub fn new() -> Self {
        MockTransport {
            script: Mutex::new(VecDeque::new()),
            default_reply: Mutex::new(MockReply::AcceptAll),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Creates a transport that is always offline.
    pub fn offline() -> Self {
        let transport = Self::new();
        transport.set_default(MockReply::Offline);
        transport
    }

    /// Queues a one-shot reply.
    pub fn push_reply(&self, reply: MockReply) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }

    /// Sets the reply used once the script is exhausted.
    pub fn set_default(&self, reply: MockReply) {
        if let Ok(mut default_reply) = self.default_reply.lock() {
            *default_reply = reply;
        }
    }

    /// Batches received so far, including ones answered with `Offline`.
    pub fn uploads(&self) -> Vec<RecordedBatch> {
        self.uploads
            .lock()
            .map(|uploads| uploads.clone())
            .unwrap_or_default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().map(|u| u.len()).unwrap_or(0)
    }

    fn next_reply(&self) -> MockReply {
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match scripted {
            Some(reply) => reply,
            None => self
                .default_reply
                .lock()
                .map(|r| r.clone())
                .unwrap_or(MockReply::Offline),
        }
    }
}

impl SyncTransport for MockTransport {
    fn upload(&self, batch: &SyncBatch) -> TransportResult<SyncResponse> {
        let body =
            serde_json::to_string(batch).map_err(|e| TransportError::Decode(e.to_string()))?;
        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push(RecordedBatch {
                device_id: batch.device_id.clone(),
                event_ids: batch.event_ids().into_iter().map(String::from).collect(),
                body,
            });
        }

        match self.next_reply() {
            MockReply::AcceptAll => Ok(SyncResponse::accept_all(batch)),
            MockReply::Reject(errors) => {
                let rejected = batch
                    .events
                    .iter()
                    .filter(|e| errors.iter().any(|r| r.client_event_id == e.client_event_id))
                    .count();
                Ok(SyncResponse {
                    synced_count: (batch.len() - rejected) as u64,
                    errors,
                })
            }
            MockReply::Respond(response) => Ok(response),
            MockReply::Offline => Err(TransportError::Unavailable("mock transport offline".into())),
        }
    }
}
