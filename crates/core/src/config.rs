//! Application configuration.
//!
//! Values come from `<config_dir>/board-shelf/config.toml` when present,
//! overridden by `SHELF_*` environment variables.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "board-shelf";
/// Default remote catalog endpoint.
pub const DEFAULT_API_URL: &str = "https://boardgamegeek.com/xmlapi2";
/// Storage key the collection is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "boardGameCollection";
/// Number of ranked search hits forwarded to hydration.
pub const DEFAULT_HYDRATION_LIMIT: usize = 20;

const DEFAULT_CONFIG: &str = r#"# board-shelf configuration
#
# api_url = "https://boardgamegeek.com/xmlapi2"
# api_token = ""
# storage_key = "boardGameCollection"
# offline_fallback = false
# exact_search = false
# hydration_limit = 20
"#;

/// Runtime settings for the catalog client, the store and the search flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the remote XML API.
    pub api_url: String,
    /// Bearer token sent with every remote request.
    pub api_token: Option<String>,
    /// Directory holding the persisted collection and logs.
    pub data_dir: PathBuf,
    /// Key the collection is stored under.
    pub storage_key: String,
    /// Serve built-in fixture games when the remote search fails.
    pub offline_fallback: bool,
    /// Ask the remote catalog for exact name matches instead of fuzzy ones.
    pub exact_search: bool,
    /// Upper bound on ids sent to the detail endpoint per search.
    pub hydration_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            data_dir: default_data_dir(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            offline_fallback: false,
            exact_search: false,
            hydration_limit: DEFAULT_HYDRATION_LIMIT,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` (optional) and the environment.
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.clone()).required(false))
            .add_source(
                Environment::with_prefix("SHELF")
                    .prefix_separator("_")
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        if config
            .api_token
            .as_deref()
            .map(|token| token.trim().is_empty())
            .unwrap_or(false)
        {
            config.api_token = None;
        }
        if config.hydration_limit == 0 {
            config.hydration_limit = DEFAULT_HYDRATION_LIMIT;
        }
        Ok(config)
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Location of the user configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Default directory for persisted data.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write a commented default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.hydration_limit, DEFAULT_HYDRATION_LIMIT);
        assert!(!config.exact_search);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_token = \"  \"\nstorage_key = \"shelf\"\nhydration_limit = 0\nexact_search = true\n",
        )?;
        let config = AppConfig::load_from(path)?;
        assert_eq!(config.storage_key, "shelf");
        assert_eq!(config.api_token, None);
        assert_eq!(config.hydration_limit, DEFAULT_HYDRATION_LIMIT);
        assert!(config.exact_search);
        Ok(())
    }

    #[test]
    fn default_template_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, DEFAULT_CONFIG)?;
        let config = AppConfig::load_from(path)?;
        assert!(!config.offline_fallback);
        Ok(())
    }
}
