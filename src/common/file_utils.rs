use crate::common::timestamp_utils;
use crate::errors::ConfigError;
use log::debug;
use std::path::PathBuf;

pub fn generate_timestamped_filename(
    base_name: &str,      // e.g., "camera_calibration"
    timestamp_format: &str, // from config, e.g., "%Y%m%d_%H%M%S"
    extension: &str,      // e.g., "json"
) -> String {
    let timestamp = timestamp_utils::current_local_timestamp_str(timestamp_format);
    format!("{}_{}.{}", base_name, timestamp, extension)
}

pub fn ensure_directory(dir_path_str: &str) -> Result<PathBuf, ConfigError> {
    let dir_path = PathBuf::from(dir_path_str);
    if !dir_path.exists() {
        debug!("Directory '{}' does not exist, attempting to create it.", dir_path.display());
        std::fs::create_dir_all(&dir_path).map_err(|e| {
            ConfigError::Io(format!(
                "Failed to create directory '{}': {}",
                dir_path.display(),
                e
            ))
        })?;
    } else if !dir_path.is_dir() {
        return Err(ConfigError::Io(format!(
            "Path '{}' exists but is not a directory.",
            dir_path.display()
        )));
    }
    Ok(dir_path)
}
