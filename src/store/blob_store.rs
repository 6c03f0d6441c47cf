use crate::core::config_store::{ConfigStore, StoreTarget};
use crate::errors::ConfigError;
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Remote blob store: documents live at `<base_url>/config/<target>.json`
/// behind a CDN. Writes are NOT immediately read-consistent, so the update
/// protocol verifies them with bounded retries.
pub struct BlobStore {
    base_url: String,
    client: Client,
}

impl BlobStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ConfigError::StoreUnavailable(format!("failed to build HTTP client: {}", e))
        })?;
        Ok(BlobStore {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn target_url(&self, target: &StoreTarget) -> String {
        format!("{}/config/{}", self.base_url, target.file_name())
    }
}

#[async_trait]
impl ConfigStore for BlobStore {
    fn describe(&self) -> String {
        format!("blob endpoint '{}'", self.base_url)
    }

    fn is_read_consistent(&self) -> bool {
        false
    }

    async fn load(&self, target: &StoreTarget) -> Result<Vec<u8>, ConfigError> {
        let url = self.target_url(target);
        debug!("📡 Fetching blob for '{}' from {}", target, url);
        // Timeouts and connection failures both land here as StoreUnavailable.
        let response = self.client.get(&url).send().await.map_err(|e| {
            ConfigError::StoreUnavailable(format!("blob fetch from '{}' failed: {}", url, e))
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ConfigError::NotFound(format!("no blob at '{}'", url)));
        }
        if !response.status().is_success() {
            return Err(ConfigError::StoreUnavailable(format!(
                "blob fetch from '{}' returned status {}",
                url,
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            ConfigError::StoreUnavailable(format!("failed to read blob body from '{}': {}", url, e))
        })?;
        debug!("📡 Received {} bytes for '{}'", bytes.len(), target);
        Ok(bytes.to_vec())
    }

    async fn save(&self, target: &StoreTarget, bytes: &[u8]) -> Result<(), ConfigError> {
        let url = self.target_url(target);
        debug!("📡 Putting {} bytes for '{}' to {}", bytes.len(), target, url);
        let response = self
            .client
            .put(&url)
            .header("Content-Type", "application/json")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| {
                ConfigError::StoreUnavailable(format!("blob put to '{}' failed: {}", url, e))
            })?;

        if !response.status().is_success() {
            return Err(ConfigError::StoreUnavailable(format!(
                "blob put to '{}' returned status {}",
                url,
                response.status()
            )));
        }
        Ok(())
    }
}
