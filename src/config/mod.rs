//! Configuration management
//!
//! Loads `CoreConfig` from a TOML file under the platform config dir.
//! The config is constructed once per session and passed to the components
//! that need it; there is no global config instance.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::types::error::{MailError, Result};

const DEFAULT_API_BASE: &str = "https://api.mailbridge.dev";
const DEFAULT_STORE_BASE: &str = "https://store.mailbridge.dev";

/// Session configuration for the sync core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Base URL of the account/send service
    #[serde(default = "default_api_base")]
    pub api_base_url: String,

    /// Base URL of the default mailbox store (per-account overrides win)
    #[serde(default = "default_store_base")]
    pub store_base_url: String,

    /// Per-request timeout in seconds for all outbound calls
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Override for the account cache file location
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_store_base() -> String {
    DEFAULT_STORE_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base(),
            store_base_url: default_store_base(),
            request_timeout_secs: default_timeout_secs(),
            cache_path: None,
        }
    }
}

impl CoreConfig {
    pub fn api_base(&self) -> Result<Url> {
        Url::parse(&self.api_base_url)
            .map_err(|e| MailError::Config(format!("Invalid api_base_url: {}", e)))
    }

    pub fn store_base(&self) -> Result<Url> {
        Url::parse(&self.store_base_url)
            .map_err(|e| MailError::Config(format!("Invalid store_base_url: {}", e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolved account cache file path
    pub fn cache_path(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(default_cache_path)
    }
}

/// Default location of the account cache file
pub fn default_cache_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailbridge")
        .join("accounts.json")
}

/// Get default config paths
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("mailbridge").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(
            home_dir
                .join(".config")
                .join("mailbridge")
                .join("config.toml"),
        );
    }

    paths
}

/// Load configuration from the first default path that exists
///
/// Falls back to built-in defaults when no config file is present; a file
/// that exists but fails to read or parse is an error, not a fallback.
pub fn load_config() -> Result<CoreConfig> {
    for path in default_config_paths() {
        if path.exists() {
            info!("Loading configuration from: {:?}", path);
            return load_config_from_path(&path);
        }
    }

    info!("No config file found, using defaults");
    Ok(CoreConfig::default())
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &PathBuf) -> Result<CoreConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| MailError::Config(format!("Failed to read config: {}", e)))?;

    toml::from_str(&content)
        .map_err(|e| MailError::Config(format!("Failed to parse config: {}", e)))
}
