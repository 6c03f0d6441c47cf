use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApplicationConfig {
    pub store_backend: String, // "local" or "blob"
    pub config_directory: String, // local backend: directory holding the target files
    pub blob_base_url: Option<String>, // blob backend: base URL of the blob endpoint
    pub proxy_base_url: String, // vendor PTZ proxy
    pub venue: Option<String>, // default venue number for proxy calls
    pub request_timeout_seconds: f32, // bound on any network-backed call
    pub python_path: String,
    pub landmark_script: String, // prints per-landmark pan/tilt as JSON lines
    pub calibration_script: String, // prints a calibration report as one JSON object
    pub export_directory: String,
    pub export_timestamp_format: String, // strftime format string
    pub log_level: Option<String>, // optional so the CLI flag or env can take over
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        ApplicationConfig {
            store_backend: "local".to_string(),
            config_directory: "./configs".to_string(),
            blob_base_url: None,
            proxy_base_url: "https://isproxy.ozapi.net".to_string(),
            venue: None,
            request_timeout_seconds: 5.0,
            python_path: "/usr/bin/python3".to_string(),
            landmark_script: "test/test_landmark_pt.py".to_string(),
            calibration_script: "test/test_calibration_std.py".to_string(),
            export_directory: "./exports".to_string(),
            export_timestamp_format: "%Yy%mm%dd%Hh%Mm%Ss".to_string(),
            log_level: Some("info".to_string()),
        }
    }
}
