// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Error Types
//!
//! Unified error type for the Fieldsync API layer.

use thiserror::Error;

use crate::location::LocationError;
use crate::storage::StorageError;
use crate::sync::{SyncError, TransportError};

/// Unified error type for Fieldsync operations.
#[derive(Error, Debug)]
pub enum FieldSyncError {
    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Sync operation failed.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Transport could not be built or used.
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// Location capture failed.
    #[error("location error: {0}")]
    Location(#[from] LocationError),

    /// Feature used without being configured.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl FieldSyncError {
    /// True when the local event store could not be used at all.
    pub fn is_storage_unavailable(&self) -> bool {
        match self {
            FieldSyncError::Storage(e) => e.is_unavailable(),
            FieldSyncError::Sync(SyncError::Storage(e)) => e.is_unavailable(),
            _ => false,
        }
    }
}

/// Result type for Fieldsync operations.
pub type FieldSyncResult<T> = Result<T, FieldSyncError>;
