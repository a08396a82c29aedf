// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Device Identity
//!
//! A random identifier generated once per installation and stamped on every
//! sync batch. Created lazily on first read, never rotated.

mod store;

pub use store::{FileIdentityStore, IdentityStore, MemoryIdentityStore};

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::storage::StorageError;

/// Name under which the device id is persisted.
pub const DEVICE_ID_KEY: &str = "device_id";

/// Number of random bytes in a device id (hex-encoded to 32 chars).
const DEVICE_ID_BYTES: usize = 16;

/// Provides the stable device identifier.
///
/// The id is cached after the first successful read; concurrent first calls
/// serialise on the cache so every caller sees the same value.
pub struct DeviceIdentityProvider {
    store: Arc<dyn IdentityStore>,
    cached: Mutex<Option<String>>,
}

impl DeviceIdentityProvider {
    /// Creates a provider backed by the given store.
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        DeviceIdentityProvider {
            store,
            cached: Mutex::new(None),
        }
    }

    /// Returns the device id, creating and persisting one on first use.
    pub fn device_id(&self) -> Result<String, StorageError> {
        let mut cached = self.cached.lock().map_err(|_| StorageError::LockPoisoned)?;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let id = match self.store.load_value(DEVICE_ID_KEY)? {
            Some(raw) => parse_device_id(raw)?,
            None => {
                let id = generate_device_id();
                self.store.save_value(DEVICE_ID_KEY, id.as_bytes())?;
                info!(device_id = %id, "generated new device identity");
                id
            }
        };

        *cached = Some(id.clone());
        Ok(id)
    }
}

fn generate_device_id() -> String {
    hex::encode(rand::random::<[u8; DEVICE_ID_BYTES]>())
}

fn parse_device_id(raw: Vec<u8>) -> Result<String, StorageError> {
    let id = String::from_utf8(raw)
        .map_err(|_| StorageError::Corrupted("device id is not valid UTF-8".into()))?;
    let id = id.trim().to_string();
    if id.is_empty() {
        return Err(StorageError::Corrupted("device id is empty".into()));
    }
    Ok(id)
}
