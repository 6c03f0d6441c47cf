use crate::core::config_store::StoreTarget;
use crate::core::update_protocol::{UpdateProtocol, UpdateRequest};
use anyhow::{Context, Result};
use clap::ArgMatches;
use log::{debug, info};
use serde_json::Value;
use std::time::Instant;

/// The `--target` argument; "main" and "modified" are the two documents the
/// venue tooling knows about, anything else addresses a scratch target.
pub fn parse_target_arg(args: &ArgMatches) -> StoreTarget {
    match args.get_one::<String>("target").map(String::as_str) {
        None | Some("main") => StoreTarget::main(),
        Some("modified") => StoreTarget::modified(),
        Some(other) => StoreTarget::named(other),
    }
}

/// CLI values are JSON when they parse as JSON, bare strings otherwise, so
/// `--value '{"a":1}'`, `--value 13` and `--value north_goal` all behave.
pub fn parse_value_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub async fn handle_set_calibration_cli(
    protocol: &UpdateProtocol,
    args: &ArgMatches,
) -> Result<()> {
    let op_start_time = Instant::now();
    let camera_id = args
        .get_one::<String>("camera")
        .context("Missing --camera argument")?
        .clone();
    let landmark = args
        .get_one::<String>("landmark")
        .context("Missing --landmark argument")?
        .clone();
    let pan = *args.get_one::<f64>("pan").context("Missing --pan argument")?;
    let tilt = *args.get_one::<f64>("tilt").context("Missing --tilt argument")?;
    let target = parse_target_arg(args);

    debug!(
        "Set-calibration: camera '{}', landmark '{}', pan {}, tilt {}, target '{}'",
        camera_id, landmark, pan, tilt, target
    );

    protocol
        .apply(
            &target,
            UpdateRequest::Calibration {
                camera_id: camera_id.clone(),
                landmark: landmark.clone(),
                pan,
                tilt,
            },
        )
        .await
        .with_context(|| {
            format!(
                "Failed to update calibration for camera '{}', landmark '{}'",
                camera_id, landmark
            )
        })?;

    info!(
        "✅ Calibration for camera '{}' landmark '{}' set to [{}, {}] in {:?}.",
        camera_id,
        landmark,
        pan,
        tilt,
        op_start_time.elapsed()
    );
    Ok(())
}

pub async fn handle_set_field_cli(protocol: &UpdateProtocol, args: &ArgMatches) -> Result<()> {
    let op_start_time = Instant::now();
    let field = args
        .get_one::<String>("field")
        .context("Missing --field argument")?
        .clone();
    let raw_value = args
        .get_one::<String>("value")
        .context("Missing --value argument")?;
    let target = parse_target_arg(args);

    protocol
        .apply(
            &target,
            UpdateRequest::Field {
                key: field.clone(),
                value: parse_value_arg(raw_value),
            },
        )
        .await
        .with_context(|| format!("Failed to update field '{}'", field))?;

    info!(
        "✅ Field '{}' updated on '{}' in {:?}.",
        field,
        target,
        op_start_time.elapsed()
    );
    Ok(())
}

pub async fn handle_set_path_cli(protocol: &UpdateProtocol, args: &ArgMatches) -> Result<()> {
    let op_start_time = Instant::now();
    let path = args
        .get_one::<String>("path")
        .context("Missing --path argument")?
        .clone();
    let raw_value = args
        .get_one::<String>("value")
        .context("Missing --value argument")?;
    let target = parse_target_arg(args);

    protocol
        .apply(
            &target,
            UpdateRequest::Path {
                path: path.clone(),
                value: parse_value_arg(raw_value),
            },
        )
        .await
        .with_context(|| format!("Failed to update path '{}'", path))?;

    info!(
        "✅ Path '{}' updated on '{}' in {:?}.",
        path,
        target,
        op_start_time.elapsed()
    );
    Ok(())
}
