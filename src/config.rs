//! Supervisor settings parsing and validation.
//!
//! Settings cover the supervisor itself (control surfaces, timeouts). The
//! set of supervised processes lives in a separate YAML document handled by
//! [`crate::resolver`].

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// HTTP control surface settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HttpConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind.
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
        }
    }
}

/// Local IPC control surface settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct IpcConfig {
    /// Whether the IPC server is started.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Named pipe / Unix socket identifier.
    #[serde(default = "default_ipc_name")]
    pub name: String,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: default_ipc_name(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "localhost".into()
}

fn default_http_port() -> u16 {
    5678
}

fn default_ipc_name() -> String {
    "proman".into()
}

fn default_stop_timeout_seconds() -> u64 {
    5
}

fn default_exit_poll_seconds() -> u64 {
    2
}

/// Supervisor settings parsed from `proman.toml`.
///
/// Every field has a default, so an empty file (or no file at all) is valid.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SupervisorConfig {
    /// Grace period granted to a process between the termination request
    /// and the forced kill.
    #[serde(default = "default_stop_timeout_seconds")]
    pub stop_timeout_seconds: u64,
    /// Interval between polls for processes that exited on their own.
    #[serde(default = "default_exit_poll_seconds")]
    pub exit_poll_seconds: u64,
    /// HTTP control surface.
    #[serde(default)]
    pub http: HttpConfig,
    /// IPC control surface.
    #[serde(default)]
    pub ipc: IpcConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            stop_timeout_seconds: default_stop_timeout_seconds(),
            exit_poll_seconds: default_exit_poll_seconds(),
            http: HttpConfig::default(),
            ipc: IpcConfig::default(),
        }
    }
}

impl SupervisorConfig {
    /// Load and validate settings from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read settings: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Stop grace period as a [`Duration`].
    #[must_use]
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_seconds)
    }

    /// Exit monitor poll interval as a [`Duration`].
    #[must_use]
    pub fn exit_poll_interval(&self) -> Duration {
        Duration::from_secs(self.exit_poll_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.stop_timeout_seconds == 0 {
            return Err(AppError::Config(
                "stop_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.exit_poll_seconds == 0 {
            return Err(AppError::Config(
                "exit_poll_seconds must be greater than zero".into(),
            ));
        }

        if self.http.host.trim().is_empty() {
            return Err(AppError::Config("http.host must not be empty".into()));
        }

        if self.ipc.enabled && self.ipc.name.trim().is_empty() {
            return Err(AppError::Config(
                "ipc.name must not be empty when ipc is enabled".into(),
            ));
        }

        Ok(())
    }
}
