// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fieldsync Facade
//!
//! Producer-facing entry point tying the event store, device identity,
//! location capture and sync engine together.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::error::{FieldSyncError, FieldSyncResult};
use super::events::{EventDispatcher, EventHandler, FieldSyncEvent};
use crate::config::FieldSyncConfig;
use crate::context::SyncContext;
use crate::location::{
    self, GeofenceCheck, LocationProvider, LocationSample, LocationValidator,
    MockLocationClassifier, Zone,
};
use crate::storage::{EventType, QueueStats};
use crate::sync::{Connectivity, ConnectivityFlag, SyncEngine, SyncError, SyncResult, SyncTransport};

/// How a recorded event left [`FieldSync::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Durably queued; the next drain will deliver it.
    SavedOffline { local_id: String },
    /// Queued and confirmed by the server straight away.
    Delivered { local_id: String },
}

impl RecordOutcome {
    pub fn local_id(&self) -> &str {
        match self {
            RecordOutcome::SavedOffline { local_id } | RecordOutcome::Delivered { local_id } => {
                local_id
            }
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, RecordOutcome::Delivered { .. })
    }
}

/// Main Fieldsync orchestrator.
///
/// # Example
///
/// ```ignore
/// use fieldsync_core::{FieldSync, FieldSyncConfig, EventType};
///
/// let fs = FieldSync::open(
///     FieldSyncConfig::with_data_dir("/data/fieldsync")
///         .with_server_url("https://ops.example.com"),
/// )?;
///
/// let outcome = fs.record(&EventType::Attendance, chrono::Utc::now(), br#"{"zone":7}"#)?;
/// if !outcome.is_delivered() {
///     // "saved offline, will sync later"
/// }
///
/// // On connectivity restore:
/// fs.sync_now()?;
/// ```
pub struct FieldSync {
    config: FieldSyncConfig,
    engine: SyncEngine<Arc<dyn SyncTransport>>,
    location: Option<LocationValidator>,
    connectivity: Arc<dyn Connectivity>,
    events: Arc<EventDispatcher>,
}

impl FieldSync {
    /// Returns a builder.
    pub fn builder() -> FieldSyncBuilder {
        FieldSyncBuilder::new()
    }

    /// Opens an on-disk instance that uploads over HTTP.
    #[cfg(feature = "http")]
    pub fn open(config: FieldSyncConfig) -> FieldSyncResult<Self> {
        FieldSyncBuilder::new().config(config).build()
    }

    // === Recording ===

    /// Records an event: durably queued first, then delivered immediately
    /// when the device reports being online.
    ///
    /// Only a storage failure is an error; a failed immediate delivery just
    /// leaves the event queued.
    pub fn record(
        &self,
        event_type: &EventType,
        event_time: DateTime<Utc>,
        payload: &[u8],
    ) -> FieldSyncResult<RecordOutcome> {
        let local_id = self.enqueue(event_type, event_time, payload)?;

        if !self.is_online() {
            debug!(local_id = %local_id, "offline, event saved for later sync");
            return Ok(RecordOutcome::SavedOffline { local_id });
        }

        if self.engine.try_sync_immediate(&local_id) {
            self.events.dispatch(FieldSyncEvent::EventDelivered {
                local_id: local_id.clone(),
            });
            Ok(RecordOutcome::Delivered { local_id })
        } else {
            Ok(RecordOutcome::SavedOffline { local_id })
        }
    }

    /// Queues an event without attempting delivery.
    pub fn enqueue(
        &self,
        event_type: &EventType,
        event_time: DateTime<Utc>,
        payload: &[u8],
    ) -> FieldSyncResult<String> {
        let local_id = self
            .context()
            .storage()
            .enqueue(event_type, event_time, payload)?;
        self.events.dispatch(FieldSyncEvent::EventQueued {
            local_id: local_id.clone(),
            event_type: event_type.clone(),
        });
        Ok(local_id)
    }

    // === Identity & connectivity ===

    pub fn device_id(&self) -> FieldSyncResult<String> {
        Ok(self.context().identity().device_id()?)
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    // === Location ===

    /// Captures a classified location sample.
    pub fn capture_location(&self) -> FieldSyncResult<LocationSample> {
        let validator = self
            .location
            .as_ref()
            .ok_or_else(|| FieldSyncError::NotConfigured("location provider".into()))?;

        let sample = validator.capture_location()?;
        if sample.mock_location {
            self.events.dispatch(FieldSyncEvent::LocationSuspect {
                latitude: sample.latitude,
                longitude: sample.longitude,
                accuracy: sample.accuracy,
            });
        }
        Ok(sample)
    }

    /// Great-circle distance in meters between two (latitude, longitude) points.
    pub fn distance_meters(&self, a: (f64, f64), b: (f64, f64)) -> f64 {
        location::distance_meters(a, b)
    }

    /// Advisory geofence check; never prevents recording.
    pub fn check_zone(&self, sample: &LocationSample, zone: &Zone) -> GeofenceCheck {
        let check = zone.check(sample);
        if let Some(warning) = check.warning() {
            warn!(zone = zone.name.as_deref().unwrap_or("unnamed"), "{warning}");
        }
        check
    }

    // === Sync ===

    /// Drains the queue if the device is online.
    ///
    /// Returns `Ok(None)` when offline or when the server could not be
    /// reached; in both cases every event is left as it was and a later
    /// trigger retries. Storage failures are returned as errors.
    pub fn sync_now(&self) -> FieldSyncResult<Option<SyncResult>> {
        if !self.is_online() {
            debug!("offline, skipping sync");
            return Ok(None);
        }

        match self.engine.drain_and_sync() {
            Ok(result) => {
                self.events.dispatch(FieldSyncEvent::SyncCompleted {
                    synced: result.synced,
                    failed: result.failed,
                    purged: result.purged,
                });
                Ok(Some(result))
            }
            Err(SyncError::Network(e)) => {
                info!(error = %e, "sync deferred, server unreachable");
                self.events.dispatch(FieldSyncEvent::SyncFailed {
                    error: e.to_string(),
                });
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn queue_stats(&self) -> FieldSyncResult<QueueStats> {
        Ok(self.context().storage().queue_stats()?)
    }

    // === Events ===

    /// Subscribes a handler to future events.
    pub fn subscribe(&self, handler: Arc<dyn EventHandler>) {
        self.events.subscribe(handler);
    }

    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    // === Accessors ===

    pub fn config(&self) -> &FieldSyncConfig {
        &self.config
    }

    pub fn context(&self) -> &SyncContext {
        self.engine.context()
    }

    pub fn engine(&self) -> &SyncEngine<Arc<dyn SyncTransport>> {
        &self.engine
    }
}

/// Builder for creating FieldSync instances.
pub struct FieldSyncBuilder {
    config: FieldSyncConfig,
    context: Option<SyncContext>,
    transport: Option<Arc<dyn SyncTransport>>,
    location_provider: Option<Arc<dyn LocationProvider>>,
    classifier: Option<Arc<dyn MockLocationClassifier>>,
    connectivity: Option<Arc<dyn Connectivity>>,
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl FieldSyncBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        FieldSyncBuilder {
            config: FieldSyncConfig::default(),
            context: None,
            transport: None,
            location_provider: None,
            classifier: None,
            connectivity: None,
            handlers: Vec::new(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: FieldSyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses an existing context instead of opening one under `data_dir`.
    pub fn context(mut self, context: SyncContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the upload transport.
    pub fn transport(mut self, transport: Arc<dyn SyncTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the platform GPS source. Without one, `capture_location` fails.
    pub fn location_provider(mut self, provider: Arc<dyn LocationProvider>) -> Self {
        self.location_provider = Some(provider);
        self
    }

    /// Replaces the heuristic mock-location classifier.
    pub fn classifier(mut self, classifier: Arc<dyn MockLocationClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Sets the connectivity signal. Defaults to always online.
    pub fn connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Adds an event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Builds the FieldSync instance.
    pub fn build(self) -> FieldSyncResult<FieldSync> {
        let context = match self.context {
            Some(context) => context,
            None => SyncContext::open(&self.config)?,
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.config)?,
        };

        if self.location_provider.is_some() && self.config.location.timeout_ms == 0 {
            return Err(FieldSyncError::Configuration(
                "location timeout_ms must be greater than zero".into(),
            ));
        }

        let location = self.location_provider.map(|provider| {
            let validator = LocationValidator::new(provider, self.config.location.timeout());
            match self.classifier {
                Some(classifier) => validator.with_classifier(classifier),
                None => validator,
            }
        });

        let connectivity = self
            .connectivity
            .unwrap_or_else(|| Arc::new(ConnectivityFlag::new(true)));

        let events = EventDispatcher::new();
        for handler in self.handlers {
            events.subscribe(handler);
        }

        Ok(FieldSync {
            engine: SyncEngine::new(context, transport, self.config.sync.clone()),
            config: self.config,
            location,
            connectivity,
            events: Arc::new(events),
        })
    }
}

impl Default for FieldSyncBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
fn default_transport(config: &FieldSyncConfig) -> FieldSyncResult<Arc<dyn SyncTransport>> {
    Ok(Arc::new(crate::sync::HttpTransport::new(&config.server)?))
}

#[cfg(not(feature = "http"))]
fn default_transport(_config: &FieldSyncConfig) -> FieldSyncResult<Arc<dyn SyncTransport>> {
    Err(FieldSyncError::NotConfigured("sync transport".into()))
}
