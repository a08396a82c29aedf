//! Fieldsync Core Library
//!
//! Offline-first capture and delivery of field events (attendance check-ins,
//! checklist completions, panic signals, GPS pings). Events are written to a
//! crash-durable local queue first and uploaded in batches once the device
//! is online; the server deduplicates on each event's local id.

pub mod api;
pub mod config;
pub mod context;
pub mod identity;
pub mod location;
pub mod storage;
pub mod sync;

pub use api::{
    CallbackHandler, EventDispatcher, EventHandler, FieldSync, FieldSyncBuilder, FieldSyncError,
    FieldSyncEvent, FieldSyncResult, RecordOutcome,
};
pub use config::{FieldSyncConfig, LocationConfig, ServerConfig, SyncConfig};
pub use context::SyncContext;
pub use identity::{DeviceIdentityProvider, FileIdentityStore, IdentityStore, MemoryIdentityStore};
pub use location::{
    classify_mock_location, distance_meters, GeofenceCheck, HeuristicClassifier, LocationError,
    LocationProvider, LocationSample, LocationValidator, MockLocationClassifier, RawFix,
    StaticLocationProvider, Zone,
};
pub use storage::{EventType, OfflineEvent, QueueStats, Storage, StorageError};
#[cfg(feature = "http")]
pub use sync::HttpTransport;
pub use sync::{
    Connectivity, ConnectivityFlag, MockReply, MockTransport, SyncBatch, SyncEngine, SyncError,
    SyncResponse, SyncResult, SyncTransport, TransportError,
};
