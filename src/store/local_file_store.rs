use crate::common::file_utils;
use crate::core::config_store::{ConfigStore, StoreTarget};
use crate::errors::ConfigError;
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

/// File-backed store: one `<target>.json` per target inside a base directory.
pub struct LocalFileStore {
    directory: PathBuf,
}

impl LocalFileStore {
    pub fn new(directory: &str) -> Result<Self, ConfigError> {
        let directory = file_utils::ensure_directory(directory)?;
        Ok(LocalFileStore { directory })
    }

    fn target_path(&self, target: &StoreTarget) -> PathBuf {
        self.directory.join(target.file_name())
    }
}

#[async_trait]
impl ConfigStore for LocalFileStore {
    fn describe(&self) -> String {
        format!("local directory '{}'", self.directory.display())
    }

    async fn load(&self, target: &StoreTarget) -> Result<Vec<u8>, ConfigError> {
        let path = self.target_path(target);
        debug!("📄 Loading '{}' from {}", target, path.display());
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound(format!(
                "no document at '{}'",
                path.display()
            ))),
            Err(e) => Err(ConfigError::StoreUnavailable(format!(
                "failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    async fn save(&self, target: &StoreTarget, bytes: &[u8]) -> Result<(), ConfigError> {
        let path = self.target_path(target);
        // Write-then-rename so a concurrent load sees old or new bytes, never
        // a partial file.
        let tmp_path = self.directory.join(format!("{}.tmp", target.file_name()));
        debug!(
            "💾 Saving {} bytes for '{}' via {}",
            bytes.len(),
            target,
            tmp_path.display()
        );
        fs::write(&tmp_path, bytes).await.map_err(|e| {
            ConfigError::StoreUnavailable(format!(
                "failed to write temp file '{}': {}",
                tmp_path.display(),
                e
            ))
        })?;
        fs::rename(&tmp_path, &path).await.map_err(|e| {
            ConfigError::StoreUnavailable(format!(
                "failed to move '{}' into place: {}",
                tmp_path.display(),
                e
            ))
        })?;
        Ok(())
    }
}
