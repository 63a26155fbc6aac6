//! Relay server binary.
//!
//! Loads `config.ron`, applies the `PORT` environment variable and CLI
//! flags, then serves relay sessions until Ctrl-C.

use std::path::Path;

use clap::Parser;
use craftline_config::{CliArgs, Config};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(Config::default_dir);

    let (mut config, origin) = match Config::load_or_create(&config_dir) {
        Ok(loaded) => loaded,
        Err(e) => {
            craftline_log::init_logging(None, None);
            tracing::error!("Failed to load config from {}: {e}", config_dir.display());
            std::process::exit(1);
        }
    };
    let env_override = config.apply_env_overrides(|key| std::env::var(key).ok());
    config.apply_cli_overrides(&args);

    craftline_log::init_logging(Some(&log_dir(&config_dir)), Some(&config));
    tracing::info!("{origin}");
    if let Err(e) = env_override {
        tracing::warn!("{e}");
    }
    tracing::info!("Craftline relay starting on port {}", config.network.server_port);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Ctrl-C received");
    };

    if let Err(e) = craftline_server::run(&config, shutdown).await {
        tracing::error!("Relay failed: {e}");
        std::process::exit(1);
    }
}

fn log_dir(config_dir: &Path) -> std::path::PathBuf {
    config_dir.join("logs")
}
