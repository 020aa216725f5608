//! TOML Configuration File Support
//!
//! Centralized configuration for both the proxy and the terminal client,
//! read from `~/.config/relay-chat/relay.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (applied by the binaries through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [proxy]
//! listen_addr = "127.0.0.1:3000"
//! upstream_url = "http://localhost:8000"
//! request_timeout_secs = 120
//! connect_timeout_secs = 10
//! max_body_bytes = 33554432
//!
//! [client]
//! proxy_url = "http://127.0.0.1:3000"
//! model = "gpt-4o-mini"
//! system_message = "You are a helpful assistant."
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `API_URL` | upstream base address |
//! | `RELAY_LISTEN` | proxy listen address |
//! | `RELAY_PROXY_URL` | proxy base address used by clients |
//! | `RELAY_MODEL` | model |
//! | `RELAY_SYSTEM_MESSAGE` | system message |
//! | `RELAY_REQUEST_TIMEOUT_SECS` | bounded wait for response headers |

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::DEFAULT_MODEL;

/// Upstream used when `API_URL` is unset
pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:8000";

/// Address the proxy binds to by default
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Proxy address clients talk to by default
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3000";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Proxy section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyToml {
    /// Socket address to listen on
    pub listen_addr: Option<String>,

    /// Upstream backend base address
    pub upstream_url: Option<String>,

    /// Bounded wait for upstream response headers, in seconds
    pub request_timeout_secs: Option<u64>,

    /// TCP connect timeout, in seconds
    pub connect_timeout_secs: Option<u64>,

    /// Largest inbound request body accepted, in bytes
    pub max_body_bytes: Option<usize>,
}

/// Client section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// Proxy base address
    pub proxy_url: Option<String>,

    /// Model to request
    pub model: Option<String>,

    /// System message sent with every request
    pub system_message: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayToml {
    /// Proxy configuration section
    pub proxy: ProxyToml,

    /// Client configuration section
    pub client: ClientToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration shared by the proxy and the client
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Address the proxy listens on
    pub listen_addr: String,

    /// Upstream backend base address (no trailing slash)
    pub upstream_url: String,

    /// Proxy base address used by clients (no trailing slash)
    pub proxy_url: String,

    /// Model to request
    pub model: String,

    /// System message sent with every request
    pub system_message: Option<String>,

    /// Bounded wait for response headers
    pub request_timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Largest inbound request body the proxy accepts
    pub max_body_bytes: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_message: None,
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            max_body_bytes: 32 * 1024 * 1024,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl RelayConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check values that would otherwise fail later at request time
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for non-HTTP base addresses,
    /// an empty listen address or zero timeouts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("upstream_url", &self.upstream_url),
            ("proxy_url", &self.proxy_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must start with http:// or https://, got {url:?}"
                )));
            }
        }
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "listen_addr must not be empty".to_string(),
            ));
        }
        if self.request_timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Values supplied on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Proxy listen address
    pub listen_addr: Option<String>,
    /// Upstream base address
    pub upstream_url: Option<String>,
    /// Proxy base address for clients
    pub proxy_url: Option<String>,
    /// Model
    pub model: Option<String>,
    /// System message
    pub system_message: Option<String>,
}

impl ConfigOverrides {
    /// Apply CLI values on top of a loaded configuration
    pub fn apply(self, config: &mut RelayConfig) {
        let mut touched = false;
        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
            touched = true;
        }
        if let Some(url) = self.upstream_url {
            config.upstream_url = trim_base_url(&url);
            touched = true;
        }
        if let Some(url) = self.proxy_url {
            config.proxy_url = trim_base_url(&url);
            touched = true;
        }
        if let Some(model) = self.model {
            config.model = model;
            touched = true;
        }
        if let Some(system) = self.system_message {
            config.system_message = Some(system);
            touched = true;
        }
        if touched {
            config.source = ConfigSource::Cli;
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/relay-chat/relay.toml` or
/// `~/.config/relay-chat/relay.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("relay-chat").join("relay.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<RelayConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then apply the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<RelayConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration using `lookup` in place of the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_with_env<F>(path: Option<PathBuf>, lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RelayConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content = read_config_file(config_path)?;
            let toml_config: RelayToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, lookup);

    Ok(config)
}

fn read_config_file(path: &PathBuf) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut RelayConfig, toml: &RelayToml) {
    if let Some(ref addr) = toml.proxy.listen_addr {
        config.listen_addr.clone_from(addr);
    }
    if let Some(ref url) = toml.proxy.upstream_url {
        config.upstream_url = trim_base_url(url);
    }
    if let Some(secs) = toml.proxy.request_timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = toml.proxy.connect_timeout_secs {
        config.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(bytes) = toml.proxy.max_body_bytes {
        config.max_body_bytes = bytes;
    }

    if let Some(ref url) = toml.client.proxy_url {
        config.proxy_url = trim_base_url(url);
    }
    if let Some(ref model) = toml.client.model {
        config.model.clone_from(model);
    }
    if let Some(ref system) = toml.client.system_message {
        config.system_message = Some(system.clone());
    }
}

/// Apply environment overrides
fn apply_env_config<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut touched = false;

    if let Some(url) = lookup("API_URL").filter(|v| !v.is_empty()) {
        config.upstream_url = trim_base_url(&url);
        touched = true;
    }
    if let Some(addr) = lookup("RELAY_LISTEN").filter(|v| !v.is_empty()) {
        config.listen_addr = addr;
        touched = true;
    }
    if let Some(url) = lookup("RELAY_PROXY_URL").filter(|v| !v.is_empty()) {
        config.proxy_url = trim_base_url(&url);
        touched = true;
    }
    if let Some(model) = lookup("RELAY_MODEL").filter(|v| !v.is_empty()) {
        config.model = model;
        touched = true;
    }
    if let Some(system) = lookup("RELAY_SYSTEM_MESSAGE").filter(|v| !v.is_empty()) {
        config.system_message = Some(system);
        touched = true;
    }
    if let Some(raw) = lookup("RELAY_REQUEST_TIMEOUT_SECS") {
        match raw.parse::<u64>() {
            Ok(secs) => {
                config.request_timeout = Duration::from_secs(secs);
                touched = true;
            }
            Err(_) => tracing::warn!(value = %raw, "Ignoring invalid RELAY_REQUEST_TIMEOUT_SECS"),
        }
    }

    if touched && config.source == ConfigSource::Default {
        config.source = ConfigSource::Env;
    }
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
