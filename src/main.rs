use anyhow::{bail, Context, Result};
use log::{debug, error, info};
use ptzcal::app_config::ApplicationConfig;
use ptzcal::cli;
use ptzcal::common::logging_setup;
use ptzcal::config_loader;
use ptzcal::core::config_store::ConfigStore;
use ptzcal::core::update_protocol::UpdateProtocol;
use ptzcal::operations;
use ptzcal::store::blob_store::BlobStore;
use ptzcal::store::local_file_store::LocalFileStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn build_store(app_settings: &ApplicationConfig) -> Result<Arc<dyn ConfigStore>> {
    match app_settings.store_backend.as_str() {
        "local" => {
            let store = LocalFileStore::new(&app_settings.config_directory)
                .context("Failed to initialize the local file store")?;
            Ok(Arc::new(store))
        }
        "blob" => {
            let base_url = app_settings
                .blob_base_url
                .as_deref()
                .context("blob_base_url must be set for the blob backend")?;
            let timeout = Duration::from_secs_f32(app_settings.request_timeout_seconds);
            let store = BlobStore::new(base_url, timeout)
                .context("Failed to initialize the blob store")?;
            Ok(Arc::new(store))
        }
        other => bail!("Unknown store_backend '{}'. Must be 'local' or 'blob'.", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let main_start_time = Instant::now();
    let matches = cli::build_cli().get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("config/ptzcal.yaml");

    let master_config = match config_loader::load_or_default(config_path) {
        Ok(cfg) => {
            logging_setup::initialize_logging(Some(&cfg), &matches);
            cfg
        }
        Err(e) => {
            logging_setup::initialize_logging(None, &matches);
            error!("❌ Failed to load settings from '{}': {:#}. Exiting.", config_path, e);
            return Err(e.context(format!("Failed to load settings from '{}'", config_path)));
        }
    };

    let store = build_store(&master_config.app_settings)?;
    info!("🚀 PTZCal starting against {}.", store.describe());
    let protocol = UpdateProtocol::new(store);

    if let Some((operation_name, sub_args)) = matches.subcommand() {
        debug!("🎬 Dispatching to subcommand: {}", operation_name);
        let op_start_time = Instant::now();

        let op_result: Result<()> = match operation_name {
            "show" => operations::config_io_op::handle_show_cli(&protocol, sub_args).await,
            "import" => operations::config_io_op::handle_import_cli(&protocol, sub_args).await,
            "export" => {
                operations::config_io_op::handle_export_cli(&master_config, &protocol, sub_args)
                    .await
            }
            "format" => operations::config_io_op::handle_format_cli(&protocol, sub_args).await,
            "set-calibration" => {
                operations::update_op::handle_set_calibration_cli(&protocol, sub_args).await
            }
            "set-field" => operations::update_op::handle_set_field_cli(&protocol, sub_args).await,
            "set-path" => operations::update_op::handle_set_path_cli(&protocol, sub_args).await,
            "move" => operations::ptz_control_op::handle_move_cli(&master_config, sub_args).await,
            "enclosure" => {
                operations::ptz_control_op::handle_enclosure_cli(&master_config, &protocol, sub_args)
                    .await
            }
            "verify-landmarks" => {
                operations::script_op::handle_verify_landmarks_cli(&master_config, sub_args).await
            }
            "check-calibration" => {
                operations::script_op::handle_check_calibration_cli(&master_config, sub_args).await
            }
            other => bail!("Subcommand '{}' not implemented.", other),
        };

        if let Err(e) = op_result {
            error!(
                "❌ Operation '{}' failed after {:?}: {:#}",
                operation_name,
                op_start_time.elapsed(),
                e
            );
            return Err(e);
        }
        info!(
            "✅ Operation '{}' completed successfully in {:?}.",
            operation_name,
            op_start_time.elapsed()
        );
    } else {
        info!("🤔 No subcommand provided. Run with --help to see available operations.");
    }

    debug!("🏁 PTZCal finished in {:?}.", main_start_time.elapsed());
    Ok(())
}
