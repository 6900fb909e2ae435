//! Configuration loading for Viper.
//!
//! Resolves the data directory and reads `config.toml` from it into
//! [`ViperConfig`]. A missing or malformed file falls back to defaults.

use std::path::{Path, PathBuf};

use viper_types::config::ViperConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "VIPER_DATA_DIR";

/// Resolve the data directory: `VIPER_DATA_DIR`, else `~/.viper`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".viper");
    }

    // Last resort: current directory
    PathBuf::from(".viper")
}

/// Path of the optional config file inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`ViperConfig::default()`].
/// - Unreadable or unparsable file: warning, then defaults.
pub async fn load_config(data_dir: &Path) -> ViperConfig {
    let path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return ViperConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return ViperConfig::default();
        }
    };

    match toml::from_str::<ViperConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            ViperConfig::default()
        }
    }
}
