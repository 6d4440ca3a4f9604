//! Application configuration loaded from file and environment.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Directory name used under the platform config and data roots.
pub const APP_DIR: &str = "roc-companion";
/// Prefix for environment overrides, e.g. `ROC_COMPANION_NAMESPACE`.
pub const ENV_PREFIX: &str = "ROC_COMPANION";

const DEFAULT_CONFIG: &str = r#"# roc-companion configuration
# storage_dir = "/path/to/storage"
# log_dir = "/path/to/logs"
namespace = "roc-companion"
"#;

/// Runtime settings for the companion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the persisted settings, one file per key.
    pub storage_dir: PathBuf,
    /// Prefix applied to every persisted key.
    pub namespace: String,
    /// Directory receiving the log file.
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            storage_dir: data_root.join("storage"),
            namespace: APP_DIR.to_string(),
            log_dir: data_root.join("logs"),
        }
    }
}

impl AppConfig {
    /// Load defaults, then the config file, then environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Same as [`load`](Self::load) with an explicit config file.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("storage_dir", defaults.storage_dir.to_string_lossy().to_string())?
            .set_default("namespace", defaults.namespace)?
            .set_default("log_dir", defaults.log_dir.to_string_lossy().to_string())?
            .add_source(File::from(path.clone()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        settings
            .try_deserialize()
            .context("failed to parse configuration")
    }
}

/// Location of the user's config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Write a commented default config file when none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    if path.exists() {
        return Ok(path);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    Ok(path)
}
