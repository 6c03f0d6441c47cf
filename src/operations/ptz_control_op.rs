use crate::config_loader::MasterConfig;
use crate::core::config_store::StoreTarget;
use crate::core::update_protocol::UpdateProtocol;
use crate::core::validation;
use crate::errors::ConfigError;
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use log::{debug, error, info};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::time::{Duration, Instant};

/// Commanded pan/tilt/zoom values, distinct from the head's measured
/// position. Field names follow the proxy's wire format.
#[derive(Debug, Clone, Serialize)]
pub struct MoveSetpoints {
    pub pansetpoint: f64,
    pub tiltsetpoint: f64,
    pub zoomsetpoint: f64,
}

/// Reduces "camera1" / "cam 1" / "1" to the bare camera number.
pub fn normalize_camera_number(raw: &str) -> Result<String, ConfigError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(ConfigError::Validation {
            field: "camera".to_string(),
            detail: format!("'{}' contains no camera number", raw),
        });
    }
    Ok(digits)
}

fn build_proxy_client(timeout_seconds: f32) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(Duration::from_secs_f32(timeout_seconds))
        .build()
        .map_err(|e| ConfigError::Network(format!("failed to build HTTP client: {}", e)))
}

/// POSTs a move event to `<proxy>/venue<venue>/engine/lut/nats`. Setpoints
/// are range-checked before anything goes on the wire.
pub async fn send_move(
    proxy_base_url: &str,
    timeout_seconds: f32,
    venue: &str,
    camera_number: &str,
    setpoints: &MoveSetpoints,
) -> Result<(), ConfigError> {
    if !validation::pan_in_range(setpoints.pansetpoint) {
        return Err(ConfigError::Validation {
            field: "pan".to_string(),
            detail: format!(
                "{} is outside [{}, {}]",
                setpoints.pansetpoint,
                validation::PAN_MIN,
                validation::PAN_MAX
            ),
        });
    }
    if !validation::tilt_in_range(setpoints.tiltsetpoint) {
        return Err(ConfigError::Validation {
            field: "tilt".to_string(),
            detail: format!(
                "{} is outside [{}, {}]",
                setpoints.tiltsetpoint,
                validation::TILT_MIN,
                validation::TILT_MAX
            ),
        });
    }
    if !validation::zoom_in_range(setpoints.zoomsetpoint) {
        return Err(ConfigError::Validation {
            field: "zoom".to_string(),
            detail: format!(
                "{} is outside [{}, {}]",
                setpoints.zoomsetpoint,
                validation::ZOOM_MIN,
                validation::ZOOM_MAX
            ),
        });
    }

    let url = format!(
        "{}/venue{}/engine/lut/nats",
        proxy_base_url.trim_end_matches('/'),
        venue
    );
    let body = json!({
        "eventName": format!("ptzcontrol.camera{}", camera_number),
        "eventData": setpoints,
    });
    debug!("📡 POST {} body {}", url, body);

    let client = build_proxy_client(timeout_seconds)?;
    let response = client.post(&url).json(&body).send().await.map_err(|e| {
        ConfigError::Network(format!("move request to '{}' failed: {}", url, e))
    })?;
    if !response.status().is_success() {
        return Err(ConfigError::Network(format!(
            "proxy responded to move with status {}",
            response.status()
        )));
    }
    let text = response.text().await.unwrap_or_default();
    debug!("Proxy response: {}", text);
    Ok(())
}

/// POSTs the enclosure-control IP list to
/// `<proxy>/venue<venue>/engine/enclosure/<action>`.
pub async fn send_enclosure(
    proxy_base_url: &str,
    timeout_seconds: f32,
    venue: &str,
    action: &str,
    camera_ips: &[String],
) -> Result<(), ConfigError> {
    let url = format!(
        "{}/venue{}/engine/enclosure/{}",
        proxy_base_url.trim_end_matches('/'),
        venue,
        action
    );
    debug!("📡 POST {} for {} camera IP(s)", url, camera_ips.len());

    let client = build_proxy_client(timeout_seconds)?;
    let response = client.post(&url).json(&camera_ips).send().await.map_err(|e| {
        ConfigError::Network(format!("enclosure request to '{}' failed: {}", url, e))
    })?;
    if !response.status().is_success() {
        return Err(ConfigError::Network(format!(
            "proxy responded to enclosure {} with status {}",
            action,
            response.status()
        )));
    }
    Ok(())
}

fn resolve_venue(master_config: &MasterConfig, args: &ArgMatches) -> Result<String> {
    match args.get_one::<String>("venue") {
        Some(venue) => Ok(venue.clone()),
        None => master_config
            .app_settings
            .venue
            .clone()
            .context("No venue given; pass --venue or set 'venue' in the settings file"),
    }
}

pub async fn handle_move_cli(master_config: &MasterConfig, args: &ArgMatches) -> Result<()> {
    let op_start_time = Instant::now();
    let camera_raw = args
        .get_one::<String>("camera")
        .context("Missing --camera argument")?;
    let camera_number = normalize_camera_number(camera_raw)?;
    let venue = resolve_venue(master_config, args)?;

    let setpoints = MoveSetpoints {
        pansetpoint: *args.get_one::<f64>("pan").context("Missing --pan argument")?,
        tiltsetpoint: *args.get_one::<f64>("tilt").context("Missing --tilt argument")?,
        zoomsetpoint: args.get_one::<f64>("zoom").copied().unwrap_or(12000.0),
    };

    info!(
        "🎯 Moving camera{} at venue{} to pan {}, tilt {}, zoom {}...",
        camera_number,
        venue,
        setpoints.pansetpoint,
        setpoints.tiltsetpoint,
        setpoints.zoomsetpoint
    );

    let app = &master_config.app_settings;
    send_move(
        &app.proxy_base_url,
        app.request_timeout_seconds,
        &venue,
        &camera_number,
        &setpoints,
    )
    .await
    .with_context(|| format!("Failed to send move command for camera{}", camera_number))?;

    info!(
        "✅ Move command for camera{} sent in {:?}.",
        camera_number,
        op_start_time.elapsed()
    );
    Ok(())
}

pub async fn handle_enclosure_cli(
    master_config: &MasterConfig,
    protocol: &UpdateProtocol,
    args: &ArgMatches,
) -> Result<()> {
    let op_start_time = Instant::now();
    let action_str = args
        .get_one::<String>("action")
        .context("Missing --action argument for enclosure command")?;

    let action = match action_str.to_lowercase().as_str() {
        "open" => "open",
        "close" => "close",
        s => {
            error!("❌ Invalid action '{}'. Must be 'open' or 'close'.", s);
            bail!("Invalid action '{}'. Must be 'open' or 'close'.", s);
        }
    };
    let emoji = if action == "open" { "🔓" } else { "🔒" };
    let venue = resolve_venue(master_config, args)?;

    // Enclosure-control IPs come from the camera entries in the main document.
    let doc = protocol.fetch(&StoreTarget::main()).await?;
    let selected: Option<Vec<String>> = args.get_one::<String>("cameras").map(|s| {
        s.split(',').map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect()
    });

    let camera_ips: Vec<String> = match &selected {
        Some(ids) => {
            let mut ips = Vec::new();
            for id in ids {
                let cam = doc
                    .find_camera(id)
                    .ok_or_else(|| ConfigError::CameraNotFound(id.clone()))?;
                let ip = cam.ip().ok_or_else(|| ConfigError::Validation {
                    field: "ip".to_string(),
                    detail: format!("camera '{}' has no IP address configured", id),
                })?;
                ips.push(ip.to_string());
            }
            ips
        }
        None => doc
            .cameras()
            .filter_map(|cam| cam.ip().map(str::to_string))
            .collect(),
    };

    if camera_ips.is_empty() {
        bail!("No camera IPs available for the enclosure {} command", action);
    }

    info!(
        "{} Sending enclosure {} for {} camera(s) at venue{}...",
        emoji,
        action,
        camera_ips.len(),
        venue
    );

    let app = &master_config.app_settings;
    send_enclosure(
        &app.proxy_base_url,
        app.request_timeout_seconds,
        &venue,
        action,
        &camera_ips,
    )
    .await
    .with_context(|| format!("Failed to send enclosure {} command", action))?;

    info!(
        "{} Enclosure {} completed for {} camera(s) in {:?}.",
        emoji,
        action,
        camera_ips.len(),
        op_start_time.elapsed()
    );
    Ok(())
}
