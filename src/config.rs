//! Global configuration parsing and validation.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

fn default_http_host() -> String {
    "127.0.0.1".into()
}

fn default_http_port() -> u16 {
    8000
}

fn default_heartbeat_seconds() -> u64 {
    25
}

fn default_queue_capacity() -> usize {
    64
}

fn default_true() -> bool {
    true
}

fn default_list_changed_delay_ms() -> u64 {
    500
}

fn default_direct_list_delay_ms() -> u64 {
    1000
}

fn default_direct_list_followup_delay_ms() -> u64 {
    500
}

fn default_server_name() -> String {
    "calculator-server".into()
}

fn default_server_version() -> String {
    "1.0.0".into()
}

/// Global configuration parsed from `config.toml`.
///
/// Every field has a default, so an absent config file yields a working
/// server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Interface the HTTP listener binds to.
    #[serde(default = "default_http_host")]
    pub http_host: String,
    /// Port for the HTTP listener (SSE + message endpoints).
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Idle window before a keep-alive comment is emitted on an SSE stream.
    #[serde(default = "default_heartbeat_seconds")]
    pub heartbeat_seconds: u64,
    /// Per-connection delivery queue capacity; pushes beyond it are rejected.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Whether `initialize` schedules the direct tools-list compatibility
    /// sequence. Disable for protocol-strict deployments.
    #[serde(default = "default_true")]
    pub aggressive_direct_list: bool,
    /// Delay before the list-changed notification fires after `initialized`.
    #[serde(default = "default_list_changed_delay_ms")]
    pub list_changed_delay_ms: u64,
    /// Delay before the direct-list sequence starts after `initialize`.
    #[serde(default = "default_direct_list_delay_ms")]
    pub direct_list_delay_ms: u64,
    /// Pause between the list-changed broadcast and the direct-list frames.
    #[serde(default = "default_direct_list_followup_delay_ms")]
    pub direct_list_followup_delay_ms: u64,
    /// Server name reported in the `initialize` capability descriptor.
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Server version reported in the `initialize` capability descriptor.
    #[serde(default = "default_server_version")]
    pub server_version: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            http_host: default_http_host(),
            http_port: default_http_port(),
            heartbeat_seconds: default_heartbeat_seconds(),
            queue_capacity: default_queue_capacity(),
            aggressive_direct_list: true,
            list_changed_delay_ms: default_list_changed_delay_ms(),
            direct_list_delay_ms: default_direct_list_delay_ms(),
            direct_list_followup_delay_ms: default_direct_list_followup_delay_ms(),
            server_name: default_server_name(),
            server_version: default_server_version(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Idle window before a keep-alive comment is sent.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_seconds)
    }

    /// Delay before the list-changed notification after `initialized`.
    #[must_use]
    pub fn list_changed_delay(&self) -> Duration {
        Duration::from_millis(self.list_changed_delay_ms)
    }

    /// Delay before the direct-list sequence after `initialize`.
    #[must_use]
    pub fn direct_list_delay(&self) -> Duration {
        Duration::from_millis(self.direct_list_delay_ms)
    }

    /// Pause between the two phases of the direct-list sequence.
    #[must_use]
    pub fn direct_list_followup_delay(&self) -> Duration {
        Duration::from_millis(self.direct_list_followup_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(AppError::Config(
                "queue_capacity must be greater than zero".into(),
            ));
        }

        if self.heartbeat_seconds == 0 {
            return Err(AppError::Config(
                "heartbeat_seconds must be greater than zero".into(),
            ));
        }

        if self.server_name.is_empty() {
            return Err(AppError::Config("server_name must not be empty".into()));
        }

        Ok(())
    }
}
