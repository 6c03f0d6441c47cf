use crate::app_config::ApplicationConfig;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MasterConfig {
    #[serde(rename = "application", default)]
    pub app_settings: ApplicationConfig,
}

/// Loads the YAML settings file, falling back to built-in defaults when the
/// file does not exist. A present-but-broken file is still an error.
pub fn load_or_default(path: &str) -> Result<MasterConfig> {
    if !Path::new(path).exists() {
        info!("📄 No settings file at '{}', using built-in defaults.", path);
        let config = MasterConfig::default();
        validate_master_config(&config)?;
        return Ok(config);
    }
    load_config(path)
}

pub fn load_config(path: &str) -> Result<MasterConfig> {
    debug!("📄 Attempting to load settings from: {}", path);
    let start_time = Instant::now();

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file '{}'. 📖", path))?;

    let config: MasterConfig = serde_yaml::from_str(&config_str)
        .with_context(|| format!("Failed to parse YAML settings from '{}'. 💔", path))?;

    validate_master_config(&config).with_context(|| "Settings validation failed 👎")?;

    info!(
        "✅ Successfully loaded and validated settings from '{}' in {:?}",
        path,
        start_time.elapsed()
    );
    Ok(config)
}

fn validate_master_config(config: &MasterConfig) -> Result<()> {
    debug!("🕵️ Validating settings...");
    let app = &config.app_settings;

    match app.store_backend.as_str() {
        "local" => {
            if app.config_directory.is_empty() {
                bail!("❌ config_directory cannot be empty for the local backend.");
            }
        }
        "blob" => {
            let base_url = app
                .blob_base_url
                .as_deref()
                .unwrap_or_default();
            if base_url.is_empty() {
                bail!("❌ blob_base_url must be set for the blob backend.");
            }
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                bail!("❌ blob_base_url '{}' must be an http(s) URL.", base_url);
            }
        }
        other => bail!("❌ Unknown store_backend '{}'. Must be 'local' or 'blob'.", other),
    }

    if app.proxy_base_url.is_empty() {
        bail!("❌ proxy_base_url cannot be empty.");
    }
    if app.request_timeout_seconds <= 0.0 {
        bail!(
            "❌ request_timeout_seconds must be positive, got {}.",
            app.request_timeout_seconds
        );
    }
    if app.python_path.is_empty() {
        bail!("❌ python_path cannot be empty.");
    }
    if app.export_timestamp_format.is_empty() {
        bail!("❌ export_timestamp_format cannot be empty.");
    }

    debug!("👍 Settings validated successfully.");
    Ok(())
}
