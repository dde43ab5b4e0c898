//! Results reported by lifecycle requests and `describe`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::ProcessStatus;
use crate::process::ProcessConfig;

/// Lifecycle operation requested on a process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    /// Launch the OS-level unit.
    Start,
    /// Terminate the OS-level unit.
    Stop,
}

/// Outcome of a `start` or `stop` request.
///
/// Lifecycle failures are carried here with `ok == false` rather than as
/// errors, so bulk operations and control surfaces always get a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LifecycleOutcome {
    /// Process name.
    pub name: String,
    /// Requested operation.
    pub action: LifecycleAction,
    /// Status after the request completed.
    pub status: ProcessStatus,
    /// Whether the request succeeded (including idempotent no-ops).
    pub ok: bool,
    /// Human-readable description of what happened.
    pub message: String,
}

impl LifecycleOutcome {
    /// Successful outcome.
    #[must_use]
    pub fn success(
        name: &str,
        action: LifecycleAction,
        status: ProcessStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            action,
            status,
            ok: true,
            message: message.into(),
        }
    }

    /// Failed outcome.
    #[must_use]
    pub fn failure(
        name: &str,
        action: LifecycleAction,
        status: ProcessStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            action,
            status,
            ok: false,
            message: message.into(),
        }
    }
}

/// Read-only snapshot returned by `describe`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ProcessDescription {
    /// Process name.
    pub name: String,
    /// Kind that produced the process.
    pub kind: String,
    /// Current lifecycle status.
    pub status: ProcessStatus,
    /// Whether the process starts on registration.
    pub active: bool,
    /// OS process id while running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Time of the last successful start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Exit code observed the last time the OS-level unit ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Kind-specific descriptive fields.
    #[serde(flatten)]
    pub details: ProcessConfig,
}
