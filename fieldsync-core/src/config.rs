// SPDX-FileCopyrightText: 2026 Fieldsync Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration
//!
//! Configuration types for the sync engine, server endpoint and location capture.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sync::CLIENT_VERSION;

/// Configuration for a Fieldsync instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSyncConfig {
    /// Directory holding the event database and the device identity.
    pub data_dir: PathBuf,

    /// Sync endpoint configuration.
    pub server: ServerConfig,

    /// Sync engine configuration.
    pub sync: SyncConfig,

    /// Location capture configuration.
    pub location: LocationConfig,
}

impl Default for FieldSyncConfig {
    fn default() -> Self {
        FieldSyncConfig {
            data_dir: PathBuf::from("./fieldsync_data"),
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
            location: LocationConfig::default(),
        }
    }
}

impl FieldSyncConfig {
    /// Creates a new configuration with the given data directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        FieldSyncConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Sets the server URL.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server.url = url.into();
        self
    }

    /// Sets the bearer token sent with uploads.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.server.api_token = Some(token.into());
        self
    }

    /// Loads configuration from `FIELDSYNC_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = FieldSyncConfig::default();

        if let Some(dir) = lookup("FIELDSYNC_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("FIELDSYNC_SERVER_URL") {
            config.server.url = url;
        }
        if let Some(token) = lookup("FIELDSYNC_API_TOKEN") {
            config.server.api_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(size) = parse_var(&lookup, "FIELDSYNC_BATCH_SIZE") {
            config.sync.batch_size = size;
        }
        if let Some(ms) = parse_var(&lookup, "FIELDSYNC_HTTP_TIMEOUT_MS") {
            config.server.timeout_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, "FIELDSYNC_LOCATION_TIMEOUT_MS") {
            config.location.timeout_ms = ms;
        }

        config
    }

    /// Path of the event database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("events.db")
    }

    /// Directory holding identity values.
    pub fn identity_dir(&self) -> PathBuf {
        self.data_dir.join("identity")
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable configuration value");
            None
        }
    }
}

/// Sync endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the operations API.
    pub url: String,

    /// Path of the batch upload endpoint.
    pub sync_path: String,

    /// Bearer token, if the API requires one.
    pub api_token: Option<String>,

    /// Whole-request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            url: String::new(),
            sync_path: "/sync/events".to_string(),
            api_token: None,
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        ServerConfig {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Full URL of the batch upload endpoint.
    pub fn sync_endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            self.sync_path.trim_start_matches('/')
        )
    }
}

/// Sync engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of events per upload.
    pub batch_size: usize,

    /// Delete confirmed events at the end of every successful drain.
    pub compact_after_sync: bool,

    /// Version string sent as `client_version` with each event.
    pub client_version: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            batch_size: 100,
            compact_after_sync: true,
            client_version: CLIENT_VERSION.to_string(),
        }
    }
}

impl SyncConfig {
    /// Batch size, never below one.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

/// Location capture configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Hard limit on waiting for a GPS fix, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig { timeout_ms: 10_000 }
    }
}

impl LocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
