use crate::config_loader::MasterConfig;
use crate::core::validation;
use crate::operations::ptz_control_op::normalize_camera_number;
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::time::Instant;
use tokio::process::Command;

/// Runs one of the external calibration scripts and returns its stdout.
/// A non-zero exit relays the script's stderr.
async fn run_script(
    python_path: &str,
    script_path: &str,
    camera_number: &str,
) -> Result<String> {
    info!("🐍 Running '{}' for camera{}...", script_path, camera_number);
    let start_time = Instant::now();

    // PYTHONHOME from the launching shell would point the interpreter at the
    // wrong stdlib, so it must not leak into the child. PYTHONPATH is pinned
    // to whatever the caller exported, or empty.
    let output = Command::new(python_path)
        .arg(script_path)
        .arg(camera_number)
        .env(
            "PYTHONPATH",
            std::env::var("PYTHONPATH").unwrap_or_default(),
        )
        .env_remove("PYTHONHOME")
        .output()
        .await
        .with_context(|| format!("Failed to spawn '{}' '{}'", python_path, script_path))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    debug!(
        "Script '{}' exited with {:?} in {:?} ({} stdout bytes)",
        script_path,
        output.status.code(),
        start_time.elapsed(),
        stdout.len()
    );

    if !output.status.success() {
        let detail = if stderr.trim().is_empty() {
            "Test failed".to_string()
        } else {
            stderr.trim().to_string()
        };
        bail!("Script '{}' failed: {}", script_path, detail);
    }
    Ok(stdout)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Parses the landmark script's JSON-lines output. Each line is
/// `{"<landmark>": {"pan": x, "tilt": y}}`; unparsable lines are skipped and
/// only landmarks whose pan/tilt fall inside the valid setpoint ranges are
/// kept, rounded to two decimals.
pub fn parse_landmark_lines(output: &str) -> Map<String, Value> {
    let mut results = Map::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(_) => {
                warn!("Skipping unparsable script line: {}", line);
                continue;
            }
        };
        let obj = match parsed.as_object() {
            Some(obj) => obj,
            None => continue,
        };
        let (landmark_id, values) = match obj.iter().next() {
            Some(entry) => entry,
            None => continue,
        };
        let pan = values.get("pan").and_then(Value::as_f64);
        let tilt = values.get("tilt").and_then(Value::as_f64);
        if let (Some(pan), Some(tilt)) = (pan, tilt) {
            if validation::pan_in_range(pan) && validation::tilt_in_range(tilt) {
                results.insert(
                    landmark_id.clone(),
                    serde_json::json!({ "pan": round2(pan), "tilt": round2(tilt) }),
                );
            }
        }
    }
    results
}

pub async fn handle_verify_landmarks_cli(
    master_config: &MasterConfig,
    args: &ArgMatches,
) -> Result<()> {
    let camera_raw = args
        .get_one::<String>("camera")
        .context("Missing --camera argument")?;
    let camera_number = normalize_camera_number(camera_raw)?;

    let app = &master_config.app_settings;
    let stdout = run_script(&app.python_path, &app.landmark_script, &camera_number).await?;
    let results = parse_landmark_lines(&stdout);

    info!(
        "✅ {} landmark(s) within range for camera{}.",
        results.len(),
        camera_number
    );
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

pub async fn handle_check_calibration_cli(
    master_config: &MasterConfig,
    args: &ArgMatches,
) -> Result<()> {
    let camera_raw = args
        .get_one::<String>("camera")
        .context("Missing --camera argument")?;
    let camera_number = normalize_camera_number(camera_raw)?;

    let app = &master_config.app_settings;
    let stdout = run_script(&app.python_path, &app.calibration_script, &camera_number).await?;

    // The calibration script emits one JSON report; relay it verbatim once it
    // is confirmed to be JSON.
    let report: Value = serde_json::from_str(stdout.trim())
        .context("Calibration script produced invalid output format")?;

    info!("✅ Calibration check completed for camera{}.", camera_number);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
