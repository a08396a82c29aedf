// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fieldsync API Layer
//!
//! High-level API used by the producer pages of a field app.
//!
//! # Overview
//!
//! The API layer coordinates:
//! - Recording events into the durable queue
//! - Immediate delivery when online, batch sync otherwise
//! - Location capture and advisory geofence checks
//! - Event handling
//!
//! # Example
//!
//! ```ignore
//! use fieldsync_core::api::FieldSync;
//! use fieldsync_core::{EventType, FieldSyncConfig};
//!
//! let fs = FieldSync::open(FieldSyncConfig::from_env())?;
//! let outcome = fs.record(&EventType::Checklist, chrono::Utc::now(), br#"{"done":12}"#)?;
//! println!("queued as {}", outcome.local_id());
//! ```
//!
//! # Module Structure
//!
//! - [`error`] - Error types for the API layer
//! - [`events`] - Event system for callbacks
//! - [`fieldsync`] - Main FieldSync orchestrator

#[cfg(feature = "testing")]
pub mod error;
#[cfg(not(feature = "testing"))]
mod error;

#[cfg(feature = "testing")]
pub mod events;
#[cfg(not(feature = "testing"))]
mod events;

#[cfg(feature = "testing")]
pub mod fieldsync;
#[cfg(not(feature = "testing"))]
mod fieldsync;

// Error types
pub use error::{FieldSyncError, FieldSyncResult};

// Events
pub use events::{CallbackHandler, EventDispatcher, EventHandler, FieldSyncEvent};

// FieldSync
pub use fieldsync::{FieldSync, FieldSyncBuilder, RecordOutcome};
