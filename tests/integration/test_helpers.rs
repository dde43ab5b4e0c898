//! Shared helpers for lifecycle integration tests.
//!
//! Builds shell-backed processes, a kind that never launches, and a
//! polling helper so individual test modules can focus on behaviour.

use std::future::Future;
use std::time::Duration;

use proman::process::{shell, ManagedProcess, Process, ProcessConfig};
use proman::{AppError, Result};
use serde_json::json;
use tokio::process::Child;

/// Grace period short enough to keep timeout tests fast.
pub const SHORT_STOP_TIMEOUT: Duration = Duration::from_millis(300);

/// A shell process named `name` running `command`.
pub fn shell_process(name: &str, command: &str, active: bool) -> ManagedProcess {
    let mut inner = shell::ShellProcess::factory();
    let config = match json!({ "command": command }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("object literal"),
    };
    inner.initialize(&config).expect("valid shell config");
    ManagedProcess::new(name, shell::KIND, active, inner).with_stop_timeout(SHORT_STOP_TIMEOUT)
}

/// A long-running process that exits promptly on SIGTERM.
pub fn sleeper(name: &str, active: bool) -> ManagedProcess {
    shell_process(name, "exec sleep 30", active)
}

/// A process that ignores SIGTERM and must be force-killed.
pub fn stubborn(name: &str) -> ManagedProcess {
    shell_process(name, "trap '' TERM; exec sleep 30", false)
}

/// Kind whose launch always fails.
#[derive(Debug, Default)]
pub struct FailingProcess;

impl Process for FailingProcess {
    fn initialize(&mut self, _config: &ProcessConfig) -> Result<()> {
        Ok(())
    }

    fn start(&mut self) -> Result<Child> {
        Err(AppError::StartFailure("launcher unavailable".into()))
    }
}

/// A registered process that can never start.
pub fn failing(name: &str, active: bool) -> ManagedProcess {
    ManagedProcess::new(name, "FailingProcess", active, Box::new(FailingProcess))
}

/// Poll `check` every 20ms until it returns `true` or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
