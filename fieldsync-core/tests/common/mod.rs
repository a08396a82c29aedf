// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Shared helpers and fixtures used across test modules.

#![allow(dead_code)]

pub mod strategies;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use fieldsync_core::{
    DeviceIdentityProvider, FileIdentityStore, IdentityStore, MockTransport, Storage,
    SyncConfig, SyncContext, SyncEngine,
};

/// Installs a tracing subscriber honouring `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fixed instant plus `minutes`, for deterministic ordering.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 7, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

/// Opens an on-disk context rooted at `dir`, the way the app does after a restart.
pub fn open_context(dir: &Path) -> SyncContext {
    let storage = Storage::open(dir.join("events.db")).unwrap();
    let identity_store: Arc<dyn IdentityStore> =
        Arc::new(FileIdentityStore::new(dir.join("identity")));
    SyncContext::new(
        Arc::new(storage),
        Arc::new(DeviceIdentityProvider::new(identity_store)),
    )
}

/// Engine over an in-memory context with the given batch size.
pub fn memory_engine(
    transport: Arc<MockTransport>,
    batch_size: usize,
) -> SyncEngine<Arc<MockTransport>> {
    init_tracing();
    SyncEngine::new(
        SyncContext::in_memory().unwrap(),
        transport,
        SyncConfig {
            batch_size,
            ..Default::default()
        },
    )
}
