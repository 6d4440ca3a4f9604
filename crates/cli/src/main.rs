mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::Arc,
};

use roc_companion_core::{
    config::{self, AppConfig},
    FileStore, Settings,
};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::commands::{Cli, Context as CommandContext};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config.log_dir)?;

    let store = Arc::new(
        FileStore::open(&config.storage_dir)
            .with_context(|| format!("failed to open {}", config.storage_dir.display()))?,
    );
    let settings = Settings::new(store.clone(), &config.namespace);
    settings.ensure_loaded().await;
    tracing::debug!("settings loaded from {}", store.root().display());

    let context = CommandContext { store, settings };
    commands::run(cli.command, &context).await
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("roc-companion.log");

    let env_filter = EnvFilter::from_default_env();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
