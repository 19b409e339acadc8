//! msgblast configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main msgblast configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote messaging API configuration
    pub gateway: GatewayConfig,

    /// Dispatch pacing configuration
    pub send: SendConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .msgblast.yml
        let local_config = PathBuf::from(".msgblast.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/msgblast/msgblast.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("msgblast").join("msgblast.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Remote messaging API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Session/instance identifier passed as a query parameter
    #[serde(rename = "instance-id")]
    pub instance_id: String,

    /// Access token given literally (takes precedence over env and file)
    pub token: Option<String>,

    /// Environment variable containing the access token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// File containing the access token
    #[serde(rename = "token-file")]
    pub token_file: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            instance_id: String::new(),
            token: None,
            token_env: "MSGBLAST_TOKEN".to_string(),
            token_file: None,
            timeout_ms: 30_000,
        }
    }
}

impl GatewayConfig {
    /// Resolve the access token: literal value, then environment variable,
    /// then token file
    pub fn resolve_token(&self) -> Result<String> {
        if let Some(token) = &self.token
            && !token.trim().is_empty()
        {
            return Ok(token.trim().to_string());
        }

        if let Ok(token) = std::env::var(&self.token_env)
            && !token.trim().is_empty()
        {
            return Ok(token.trim().to_string());
        }

        if let Some(path) = &self.token_file {
            let token =
                fs::read_to_string(path).context(format!("Failed to read token file {}", path.display()))?;
            if !token.trim().is_empty() {
                return Ok(token.trim().to_string());
            }
        }

        Err(eyre::eyre!(
            "No access token found. Pass --token, set the {} environment variable, or set gateway.token-file in your config.",
            self.token_env
        ))
    }
}

/// Dispatch pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    /// Default inter-message delay in seconds
    #[serde(rename = "delay-secs")]
    pub delay_secs: u64,

    /// Floor applied to any requested delay
    #[serde(rename = "min-delay-secs")]
    pub min_delay_secs: u64,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            delay_secs: 5,
            min_delay_secs: 1,
        }
    }
}

impl SendConfig {
    /// Resolve the inter-message delay, applying the configured floor
    ///
    /// Returns the clamped duration and whether clamping occurred.
    pub fn effective_delay(&self, requested_secs: Option<u64>) -> (Duration, bool) {
        let requested = requested_secs.unwrap_or(self.delay_secs);
        if requested < self.min_delay_secs {
            (Duration::from_secs(self.min_delay_secs), true)
        } else {
            (Duration::from_secs(requested), false)
        }
    }
}
