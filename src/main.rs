//! Contexxt - visual inspector for page media and elements
//!
//! Command-line harness that runs the overlay registry and the inspection
//! popover against JSON page snapshots.

mod cli;
mod cmd_page;
mod cmd_settings;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contexxt_config::{ConfigLoader, FileSettingsStore};
use contexxt_protocols::Point;

use crate::cli::{Cli, Commands};

const DEFAULT_LOG_FILTER: &str = "contexxt=info";

/// Initialize tracing with stderr output and an optional rolling log file.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("contexxt")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        // Command output goes to stdout, logs to stderr.
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref())?;

    let config = ConfigLoader::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    let store = Arc::new(FileSettingsStore::new(config.settings.resolve_path()));
    debug!("Using settings file {}", store.path().display());

    match cli.command {
        Commands::Overlays { page } => cmd_page::overlays(&store, &page).await,
        Commands::Inspect {
            page,
            node,
            x,
            y,
            offline,
        } => cmd_page::inspect(&config, store, &page, node, Point::new(x, y), offline).await,
        Commands::Settings { action } => {
            cmd_settings::handle_settings_command(&store, action).await
        }
    }
}
