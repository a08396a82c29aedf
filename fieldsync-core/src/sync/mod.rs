// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Module
//!
//! Uploads queued events to the operations server in batches and reconciles
//! the per-event outcome back into the local queue. Handles the immediate
//! delivery path, connectivity checks and the HTTP wire transport.

mod connectivity;
pub mod engine;
#[cfg(feature = "http")]
mod http;
pub mod protocol;
pub mod transport;

pub use connectivity::{Connectivity, ConnectivityFlag};
pub use engine::{SyncEngine, SyncError, SyncResult};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use protocol::{BatchEvent, EventError, SyncBatch, SyncResponse, CLIENT_VERSION};
pub use transport::{
    MockReply, MockTransport, RecordedBatch, SyncTransport, TransportError, TransportResult,
};
