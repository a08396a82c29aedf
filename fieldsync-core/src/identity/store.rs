// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity Value Storage
//!
//! Small named values (the device identifier) persisted outside the event
//! database, so resetting the queue never changes who the device is.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::storage::StorageError;

/// Trait for persisting named identity values.
pub trait IdentityStore: Send + Sync {
    /// Saves a value, replacing any previous one.
    fn save_value(&self, name: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Loads a value.
    /// Returns None if the value doesn't exist.
    fn load_value(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Deletes a value. Deleting a missing value is not an error.
    fn delete_value(&self, name: &str) -> Result<(), StorageError>;

    /// Checks if a value exists.
    fn has_value(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.load_value(name)?.is_some())
    }
}

/// File-based identity storage: one file per value inside a directory.
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    /// Creates a new file-based store rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn value_file_path(&self, name: &str) -> PathBuf {
        // Sanitize the name to prevent path traversal
        let safe_name = name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();
        self.path.join(format!("{}.id", safe_name))
    }
}

/// Flushes directory entries so a completed rename survives power loss.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

impl IdentityStore for FileIdentityStore {
    fn save_value(&self, name: &str, value: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.path)?;

        // Write-then-rename so a crash never leaves a truncated value behind
        let file_path = self.value_file_path(name);
        let tmp_path = file_path.with_extension("id.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(value)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &file_path)?;
        sync_dir(&self.path)?;
        Ok(())
    }

    fn load_value(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.value_file_path(name)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn delete_value(&self, name: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.value_file_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// In-memory identity storage, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryIdentityStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn save_value(&self, name: &str, value: &[u8]) -> Result<(), StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .insert(name.to_string(), value.to_vec());
        Ok(())
    }

    fn load_value(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self
            .values
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .get(name)
            .cloned())
    }

    fn delete_value(&self, name: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .remove(name);
        Ok(())
    }
}
