//! Process lifecycle status.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Lifecycle status for a supervised process.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessStatus {
    /// Registered but never launched.
    #[default]
    NotStarted,
    /// OS-level unit launched and not yet stopped.
    Running,
    /// Stopped on request or exited on its own. May be restarted.
    Stopped,
    /// The last launch attempt failed.
    Failed,
    /// The last stop attempt failed or timed out.
    Error,
}

impl ProcessStatus {
    /// Stable string form, identical to the serialized value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }

    /// Whether a `start` request may launch the process from this state.
    #[must_use]
    pub fn can_start(self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Whether a `stop` request has anything to terminate.
    #[must_use]
    pub fn can_stop(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl Display for ProcessStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
