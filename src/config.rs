//! Configuration module for BookSwap

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::theme::Theme;

/// Environment variable overriding the backend URL
pub const URL_ENV: &str = "SUPABASE_URL";
/// Environment variable overriding the public (anon) key
pub const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

/// Missing or invalid backend settings. Fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing backend URL: set {URL_ENV} or backend.url in the config file")]
    MissingUrl,
    #[error("missing backend key: set {ANON_KEY_ENV} or backend.anon_key in the config file")]
    MissingAnonKey,
    #[error("invalid backend URL {0:?}: expected http(s)://...")]
    InvalidUrl(String),
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Selected theme
    #[serde(default)]
    pub theme: Theme,

    /// Hosted backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Sent as `x-application-name` on every request
    #[serde(default = "default_application_name")]
    pub application_name: String,
}

/// Backend endpoint and public key as written in the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
}

/// Fully resolved connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub url: String,
    pub anon_key: String,
    pub application_name: String,
    pub timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_application_name() -> String {
    "bookswap".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            backend: BackendConfig::default(),
            request_timeout_secs: default_request_timeout(),
            application_name: default_application_name(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        crate::paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Resolve connection settings from the process environment and this file
    pub fn connection(&self) -> Result<Connection, ConfigError> {
        self.connection_with(|key| std::env::var(key).ok())
    }

    /// Resolve connection settings with a custom environment lookup.
    ///
    /// Environment values win over the file. Empty values count as missing.
    pub fn connection_with<F>(&self, env: F) -> Result<Connection, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, file: Option<&String>| {
            env(key)
                .or_else(|| file.cloned())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let url = pick(URL_ENV, self.backend.url.as_ref()).ok_or(ConfigError::MissingUrl)?;
        let anon_key =
            pick(ANON_KEY_ENV, self.backend.anon_key.as_ref()).ok_or(ConfigError::MissingAnonKey)?;

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl(url));
        }

        Ok(Connection {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            application_name: self.application_name.clone(),
            timeout_secs: self.request_timeout_secs,
        })
    }
}
