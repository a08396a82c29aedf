//! Event System
//!
//! Notifications for the app shell: queue changes, deliveries, sync
//! outcomes and suspicious locations.

use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::storage::EventType;

/// Notifications emitted by [`FieldSync`](super::FieldSync).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSyncEvent {
    /// An event is durably stored and waiting for delivery.
    EventQueued {
        local_id: String,
        event_type: EventType,
    },

    /// The immediate path got a server confirmation.
    EventDelivered { local_id: String },

    /// A drain reached the server.
    SyncCompleted {
        synced: usize,
        /// Rejected and kept for the next drain.
        failed: usize,
        purged: usize,
    },

    /// A drain could not reach the server; the queue is unchanged.
    SyncFailed { error: String },

    /// A captured location was classified as a possible mock.
    LocationSuspect {
        latitude: f64,
        longitude: f64,
        accuracy: f64,
    },
}

/// Receives [`FieldSyncEvent`]s.
///
/// Called synchronously on the thread that caused the event; keep it short.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &FieldSyncEvent);
}

/// Adapts a closure into an [`EventHandler`].
pub struct CallbackHandler<F>(F);

impl<F> CallbackHandler<F>
where
    F: Fn(&FieldSyncEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        CallbackHandler(callback)
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(&FieldSyncEvent) + Send + Sync,
{
    fn on_event(&self, event: &FieldSyncEvent) {
        (self.0)(event)
    }
}

/// Fans events out to every subscribed handler.
///
/// Handlers can be added while the dispatcher is shared.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: Arc<dyn EventHandler>) {
        match self.handlers.write() {
            Ok(mut handlers) => handlers.push(handler),
            Err(_) => warn!("event handler list poisoned, handler dropped"),
        }
    }

    pub fn clear(&self) {
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.clear();
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().map(|h| h.len()).unwrap_or(0)
    }

    pub fn dispatch(&self, event: FieldSyncEvent) {
        // Snapshot so a handler may subscribe without deadlocking
        let handlers = match self.handlers.read() {
            Ok(handlers) => handlers.clone(),
            Err(_) => return,
        };
        for handler in handlers {
            handler.on_event(&event);
        }
    }
}
