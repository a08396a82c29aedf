//! HTTP transport for the batch sync endpoint.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::protocol::{SyncBatch, SyncResponse, CLIENT_VERSION};
use super::transport::{SyncTransport, TransportError, TransportResult};
use crate::config::ServerConfig;

/// Posts batches as JSON to `{server_url}{sync_path}`.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpTransport {
    /// Creates a transport from server configuration.
    pub fn new(config: &ServerConfig) -> TransportResult<Self> {
        if config.url.is_empty() {
            return Err(TransportError::Unavailable("server URL not configured".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(format!("Fieldsync/{CLIENT_VERSION}"))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(HttpTransport {
            client,
            endpoint: config.sync_endpoint(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SyncTransport for HttpTransport {
    fn upload(&self, batch: &SyncBatch) -> TransportResult<SyncResponse> {
        let mut request = self.client.post(&self.endpoint).json(batch);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), events = batch.len(), "sync upload answered");
        if !status.is_success() {
            return Err(TransportError::Http(status.as_u16()));
        }

        response
            .json::<SyncResponse>()
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
