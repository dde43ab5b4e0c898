//! Process abstraction shared by every supervised kind.
//!
//! A kind implements [`Process`]: it is constructed empty by the factory
//! registered in [`crate::registry::KindRegistry`], then receives its
//! configuration through [`Process::initialize`]. The lifecycle state
//! machine itself lives in [`ManagedProcess`], so kinds only deal with
//! launching and terminating their OS-level unit.

pub mod python;
pub mod shell;
pub mod streamlit;
pub mod supervised;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::{AppError, Result};

pub use supervised::ManagedProcess;

/// Configuration payload handed to [`Process::initialize`].
///
/// Also used for the kind-specific part of a `describe` snapshot.
pub type ProcessConfig = serde_json::Map<String, Value>;

/// Uniform capability set implemented by every process kind.
pub trait Process: Send + Sync + std::fmt::Debug {
    /// Populate kind-specific fields from the configuration payload.
    ///
    /// Called exactly once, right after the factory constructed the value.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidConfig`] if a required field is missing
    /// or a field has the wrong shape.
    fn initialize(&mut self, config: &ProcessConfig) -> Result<()>;

    /// Async work needed before [`start`](Self::start), such as probing
    /// the filesystem or other executables.
    ///
    /// Runs before every launch attempt. The default does nothing.
    fn prepare(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }

    /// Launch the OS-level unit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StartFailure`] if the unit cannot be launched.
    fn start(&mut self) -> Result<Child>;

    /// Terminate the OS-level unit, waiting at most `grace` before a
    /// forced kill.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StopTimeout`] when the grace period elapses, or
    /// [`AppError::Io`] when the unit cannot be signalled or awaited.
    fn stop<'a>(
        &'a mut self,
        child: &'a mut Child,
        grace: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(terminate_gracefully(child, grace))
    }

    /// Kind-specific descriptive fields. Must not mutate state.
    fn describe(&self) -> ProcessConfig {
        ProcessConfig::new()
    }
}

/// Ask `child` to exit, wait up to `grace`, then force-kill it.
///
/// # Errors
///
/// Returns [`AppError::StopTimeout`] if the child outlived the grace period
/// (it has been killed by the time this returns), or [`AppError::Io`] if
/// signalling or waiting failed.
pub async fn terminate_gracefully(child: &mut Child, grace: Duration) -> Result<()> {
    request_termination(child)?;

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(exit)) => {
            debug!(?exit, "child exited after termination request");
            Ok(())
        }
        Ok(Err(err)) => Err(AppError::Io(format!("failed to wait for child: {err}"))),
        Err(_elapsed) => {
            warn!(
                ?grace,
                "child did not exit within grace period, forcing kill"
            );
            if let Err(err) = child.kill().await {
                warn!(%err, "failed to force-kill child process");
            }
            Err(AppError::StopTimeout(format!(
                "process did not exit within {grace:?} and was killed"
            )))
        }
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // Already reaped: `wait` returns the cached status immediately.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = i32::try_from(pid).map_err(|_| AppError::Io(format!("pid {pid} out of range")))?;

    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(err) => Err(AppError::Io(format!("failed to send SIGTERM to {pid}: {err}"))),
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> Result<()> {
    child
        .start_kill()
        .map_err(|err| AppError::Io(format!("failed to terminate child: {err}")))
}

/// Spawn `cmd` as a supervised child.
///
/// Children are killed when their handle is dropped, so a replaced or
/// discarded process never leaks its OS-level unit.
///
/// # Errors
///
/// Returns [`AppError::StartFailure`] if the OS refuses the launch.
pub fn spawn(cmd: &mut Command, kind: &str) -> Result<Child> {
    cmd.stdin(Stdio::null()).kill_on_drop(true);
    cmd.spawn()
        .map_err(|err| AppError::StartFailure(format!("{kind}: failed to launch: {err}")))
}

/// Build a command that runs `command` through the platform shell.
#[must_use]
pub fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }

    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

/// Working directory and environment overrides accepted by launching kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
}

impl LaunchOptions {
    /// Read `cwd` and `env` from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidConfig`] if `cwd` is not a string or `env`
    /// is not a mapping of scalars.
    pub fn from_config(config: &ProcessConfig, kind: &str) -> Result<Self> {
        let cwd = optional_string(config, "cwd", kind)?.map(PathBuf::from);

        let env = match config.get("env") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(vars)) => vars
                .iter()
                .map(|(key, value)| {
                    scalar_to_string(value)
                        .map(|value| (key.clone(), value))
                        .ok_or_else(|| {
                            AppError::InvalidConfig(format!(
                                "{kind}: env var '{key}' must be a scalar"
                            ))
                        })
                })
                .collect::<Result<_>>()?,
            Some(other) => {
                return Err(AppError::InvalidConfig(format!(
                    "{kind}: 'env' must be a mapping, got {other}"
                )))
            }
        };

        Ok(Self { cwd, env })
    }

    /// Apply the overrides to `cmd`.
    pub fn apply(&self, cmd: &mut Command) {
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
}

/// Render a scalar configuration value as a command-line string.
///
/// Returns `None` for sequences, mappings, and null.
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Read a required string field.
///
/// # Errors
///
/// Returns [`AppError::InvalidConfig`] if the field is absent, empty, or not
/// a string.
pub fn required_string(config: &ProcessConfig, key: &str, kind: &str) -> Result<String> {
    match optional_string(config, key, kind)? {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(AppError::InvalidConfig(format!(
            "{kind}: field '{key}' must not be empty"
        ))),
        None => Err(AppError::InvalidConfig(format!(
            "{kind}: missing required field '{key}'"
        ))),
    }
}

/// Read an optional string field.
///
/// # Errors
///
/// Returns [`AppError::InvalidConfig`] if the field is present but not a
/// string.
pub fn optional_string(config: &ProcessConfig, key: &str, kind: &str) -> Result<Option<String>> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(AppError::InvalidConfig(format!(
            "{kind}: field '{key}' must be a string, got {other}"
        ))),
    }
}

/// Read an optional list of scalars, rendering each as a string.
///
/// # Errors
///
/// Returns [`AppError::InvalidConfig`] if the field is not a list of
/// scalars.
pub fn string_list(config: &ProcessConfig, key: &str, kind: &str) -> Result<Vec<String>> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                scalar_to_string(item).ok_or_else(|| {
                    AppError::InvalidConfig(format!(
                        "{kind}: every item of '{key}' must be a scalar, got {item}"
                    ))
                })
            })
            .collect(),
        Some(other) => Err(AppError::InvalidConfig(format!(
            "{kind}: field '{key}' must be a list, got {other}"
        ))),
    }
}
