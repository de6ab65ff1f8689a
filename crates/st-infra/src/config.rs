//! Configuration loading
//!
//! Reads the TOML application config from disk and resolves the local data
//! directory used by the auth cache.

use std::path::{Path, PathBuf};

use st_core::config::AppConfig;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
const APP_DIR_NAME: &str = "spot-it";

/// Load the application config, falling back to defaults when the file does
/// not exist yet.
pub async fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))?;
    Ok(config)
}

/// Platform data directory for local state (auth cache, config).
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
}

/// Data directory honoring the config override.
pub fn data_dir(config: &AppConfig) -> anyhow::Result<PathBuf> {
    match &config.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => default_data_dir(),
    }
}
