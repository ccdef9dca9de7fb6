//! Application configuration.
//!
//! The only runtime setting is the API base URL, read from the `API_URL`
//! environment variable (a `.env` file is loaded by the binary first).
//! Storage and logs live in the platform data directory, e.g.
//! `~/.local/share/myevol` on Linux.

use std::path::PathBuf;

use reqwest::Url;
use thiserror::Error;

/// Application name used for data directory paths
const APP_NAME: &str = "myevol";

/// Environment variable holding the API base URL
pub const API_URL_VAR: &str = "API_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API_URL is not set; add it to the environment or a .env file")]
    MissingApiUrl,

    #[error("API_URL is not a valid URL ({value}): {reason}")]
    InvalidApiUrl { value: String, reason: String },

    #[error("Could not find a data directory for this platform")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_value(std::env::var(API_URL_VAR).ok())
    }

    fn from_value(value: Option<String>) -> Result<Self, ConfigError> {
        let value = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;
        Self::new(&value)
    }

    /// Validate and normalise an API base URL
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidApiUrl {
            value: api_url.to_string(),
            reason,
        };

        let url = Url::parse(api_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn log_dir() -> Result<PathBuf, ConfigError> {
        Ok(Self::data_dir()?.join("logs"))
    }
}
