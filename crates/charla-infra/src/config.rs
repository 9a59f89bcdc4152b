//! Configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.charla/` in
//! production, `CHARLA_DATA_DIR` override) and deserializes it into
//! [`CharlaConfig`]. Falls back to defaults when the file is missing
//! or malformed rather than refusing to start.

use std::path::{Path, PathBuf};

use charla_types::config::CharlaConfig;

/// Resolve the data directory from `CHARLA_DATA_DIR`, falling back to
/// `~/.charla`.
pub fn data_dir() -> PathBuf {
    match std::env::var("CHARLA_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".charla")
        }
    }
}

/// Default database URL under the data directory.
pub fn default_database_url() -> String {
    format!("sqlite://{}/charla.db?mode=rwc", data_dir().display())
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`CharlaConfig::default()`].
/// - Unreadable or unparseable file: logs a warning, returns the default.
pub async fn load_config(data_dir: &Path) -> CharlaConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return CharlaConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return CharlaConfig::default();
        }
    };

    match toml::from_str::<CharlaConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            CharlaConfig::default()
        }
    }
}
