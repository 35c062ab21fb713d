//! Server configuration
//!
//! Loads settings from a TOML file with environment overrides and
//! validates them before the server starts.

use config::{Config, Environment, File};
use serde::Deserialize;

/// Default maximum accepted line length in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// Server configuration
///
/// Immutable after load. `banned_phrases` feeds the phrase filter;
/// `idle_shutdown` controls whether the server stops accepting
/// connections once the last registered client leaves.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind the listener
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// TCP port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Display name announced in the startup log
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Phrases suppressed from chat (matched case-insensitively)
    #[serde(default)]
    pub banned_phrases: Vec<String>,

    /// Stop accepting connections when the registry empties
    #[serde(default = "default_idle_shutdown")]
    pub idle_shutdown: bool,

    /// Maximum accepted line length in bytes
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7878
}

fn default_server_name() -> String {
    "chat-hub".to_string()
}

fn default_idle_shutdown() -> bool {
    true
}

fn default_max_line_length() -> usize {
    DEFAULT_MAX_LINE_LENGTH
}

impl ServerConfig {
    /// Load configuration from the given file (without extension suffix
    /// requirements; TOML expected) plus `CHAT_`-prefixed environment
    /// overrides. A missing file falls back to defaults + environment.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("CHAT"))
            .build()?;

        let cfg: ServerConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Get bind address and port as a socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.server_name.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "server_name cannot be empty".into(),
            ));
        }

        if self.max_line_length == 0 {
            return Err(config::ConfigError::Message(
                "max_line_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            server_name: default_server_name(),
            banned_phrases: Vec::new(),
            idle_shutdown: default_idle_shutdown(),
            max_line_length: default_max_line_length(),
        }
    }
}
