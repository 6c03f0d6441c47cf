use crate::common::file_utils;
use crate::config_loader::MasterConfig;
use crate::core::config_store::StoreTarget;
use crate::core::document::ConfigDocument;
use crate::core::update_protocol::UpdateProtocol;
use crate::errors::ConfigError;
use crate::operations::update_op::parse_target_arg;
use anyhow::{Context, Result};
use clap::ArgMatches;
use log::{debug, info};
use std::time::Instant;
use tokio::fs;

pub async fn handle_show_cli(protocol: &UpdateProtocol, args: &ArgMatches) -> Result<()> {
    let target = parse_target_arg(args);
    debug!("Showing document for target '{}'", target);
    let doc = protocol
        .fetch(&target)
        .await
        .with_context(|| format!("Failed to fetch document for target '{}'", target))?;
    let text = String::from_utf8(doc.serialize()?)
        .context("Document serialized to invalid UTF-8")?;
    println!("{}", text);
    Ok(())
}

/// Imports a calibration file into BOTH the main and modified targets, the
/// way the venue operators expect a fresh upload to behave. The two saves are
/// not transactional; a failure between them can leave the targets divergent
/// until the import is re-run.
pub async fn handle_import_cli(
    protocol: &UpdateProtocol,
    args: &ArgMatches,
) -> Result<()> {
    let op_start_time = Instant::now();
    let file_path = args
        .get_one::<String>("file")
        .context("Missing --file argument for import")?;

    info!("📥 Importing calibration file '{}'...", file_path);
    let bytes = fs::read(file_path)
        .await
        .with_context(|| format!("Failed to read import file '{}'", file_path))?;

    // Shape-check before touching the store; the imported bytes themselves
    // are persisted verbatim.
    ConfigDocument::parse(&bytes)
        .with_context(|| format!("Import file '{}' is not a valid calibration document", file_path))?;

    let store = protocol.store();
    for target in [StoreTarget::main(), StoreTarget::modified()] {
        store
            .save(&target, &bytes)
            .await
            .with_context(|| format!("Failed to save imported document to '{}'", target))?;
        debug!("  Saved imported document to '{}'.", target);
    }

    info!(
        "✅ Imported '{}' to both targets ({} bytes) in {:?}.",
        file_path,
        bytes.len(),
        op_start_time.elapsed()
    );
    Ok(())
}

/// Rewrites a stored target in canonical form. Useful after hand-edits or an
/// import of compact JSON left a target with irregular formatting or numeric
/// camera ids.
pub async fn handle_format_cli(protocol: &UpdateProtocol, args: &ArgMatches) -> Result<()> {
    let target = parse_target_arg(args);
    match protocol.normalize(&target).await {
        Ok(_) => Ok(()),
        Err(ConfigError::NotFound(_)) => {
            anyhow::bail!("Nothing to format: target '{}' has never been saved", target)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to format target '{}'", target)),
    }
}

/// Exports the modified document to `camera_calibration_<timestamp>.json`.
/// Unlike `show`, a missing target is an error here: exporting a document
/// nobody ever saved would silently produce an empty file.
pub async fn handle_export_cli(
    master_config: &MasterConfig,
    protocol: &UpdateProtocol,
    args: &ArgMatches,
) -> Result<()> {
    let op_start_time = Instant::now();
    let target = StoreTarget::modified();

    let bytes = match protocol.store().load(&target).await {
        Ok(bytes) => bytes,
        Err(ConfigError::NotFound(_)) => {
            anyhow::bail!("Nothing to export: target '{}' has never been saved", target)
        }
        Err(e) => return Err(e).context("Failed to load the modified document for export"),
    };
    ConfigDocument::parse(&bytes).context("Stored modified document failed validation")?;

    let output_dir = match args.get_one::<String>("output") {
        Some(dir) => dir.clone(),
        None => master_config.app_settings.export_directory.clone(),
    };
    let output_dir = file_utils::ensure_directory(&output_dir)?;

    let filename = file_utils::generate_timestamped_filename(
        "camera_calibration",
        &master_config.app_settings.export_timestamp_format,
        "json",
    );
    let out_path = output_dir.join(&filename);
    fs::write(&out_path, &bytes)
        .await
        .with_context(|| format!("Failed to write export file '{}'", out_path.display()))?;

    info!(
        "✅ Exported '{}' ({} bytes) to {} in {:?}.",
        target,
        bytes.len(),
        out_path.display(),
        op_start_time.elapsed()
    );
    println!("{}", out_path.display());
    Ok(())
}
