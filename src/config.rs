//! Configuration management for sqldeck.
//!
//! Handles loading configuration from TOML files, covering the backend API
//! base URL, request timeouts, and default query limits.

use crate::error::{Result, SqldeckError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Name of the capability flag gating backend mirroring of tab state.
pub const PERSISTENCE_FLAG: &str = "sqllab_backend_persistence";

/// Main configuration structure for sqldeck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the workbench backend API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds for backend calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default row limit applied to queries without an explicit limit.
    #[serde(default = "default_row_limit")]
    pub default_row_limit: u64,

    /// Row limit applied to table data-preview queries.
    #[serde(default = "default_preview_limit")]
    pub preview_row_limit: u64,
}

fn default_base_url() -> String {
    "http://localhost:8088".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_row_limit() -> u64 {
    1000
}

fn default_preview_limit() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            default_row_limit: default_row_limit(),
            preview_row_limit: default_preview_limit(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqldeck")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SqldeckError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| {
            SqldeckError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates field values that serde cannot check structurally.
    fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .map_err(|e| SqldeckError::config(format!("Invalid base_url '{}': {e}", self.base_url)))?;
        if self.timeout_secs == 0 {
            return Err(SqldeckError::config("timeout_secs must be greater than 0"));
        }
        Ok(())
    }
}
