//! Shared process-wide resources.

use std::sync::Arc;

use crate::config::FieldSyncConfig;
use crate::identity::{DeviceIdentityProvider, FileIdentityStore, IdentityStore, MemoryIdentityStore};
use crate::storage::{Storage, StorageError};

/// The event store and device identity, created once and handed to every
/// component that needs them.
///
/// Cloning is cheap and shares the same underlying resources. Tests build
/// one context per case for full isolation.
#[derive(Clone)]
pub struct SyncContext {
    storage: Arc<Storage>,
    identity: Arc<DeviceIdentityProvider>,
}

impl SyncContext {
    pub fn new(storage: Arc<Storage>, identity: Arc<DeviceIdentityProvider>) -> Self {
        SyncContext { storage, identity }
    }

    /// Opens the on-disk store and identity under `config.data_dir`.
    pub fn open(config: &FieldSyncConfig) -> Result<Self, StorageError> {
        let storage = Storage::open(config.database_path())?;
        let identity_store: Arc<dyn IdentityStore> =
            Arc::new(FileIdentityStore::new(config.identity_dir()));
        Ok(SyncContext::new(
            Arc::new(storage),
            Arc::new(DeviceIdentityProvider::new(identity_store)),
        ))
    }

    /// Creates a fully in-memory context.
    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(SyncContext::new(
            Arc::new(Storage::in_memory()?),
            Arc::new(DeviceIdentityProvider::new(Arc::new(
                MemoryIdentityStore::new(),
            ))),
        ))
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn identity(&self) -> &Arc<DeviceIdentityProvider> {
        &self.identity
    }
}
