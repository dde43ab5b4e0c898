//! Lifecycle state machine wrapped around a process kind.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::process::Child;
use tokio::sync::watch;
use tracing::{error, info, info_span, warn, Instrument};

use super::{Process, ProcessConfig};
use crate::models::{LifecycleAction, LifecycleOutcome, ProcessDescription, ProcessStatus};

/// Grace period between the termination request and the forced kill.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// A named, initialized process together with its lifecycle state.
///
/// `name` and `kind` are fixed at construction. `status` only changes
/// through [`start`](Self::start), [`stop`](Self::stop), and
/// [`poll_exit`](Self::poll_exit); every change is published to the
/// receivers handed out by [`subscribe`](Self::subscribe).
#[derive(Debug)]
pub struct ManagedProcess {
    name: String,
    kind: String,
    status: watch::Sender<ProcessStatus>,
    active: bool,
    inner: Box<dyn Process>,
    child: Option<Child>,
    started_at: Option<DateTime<Utc>>,
    exit_code: Option<i32>,
    stop_timeout: Duration,
}

impl ManagedProcess {
    /// Wrap an already initialized kind instance.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        active: bool,
        inner: Box<dyn Process>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            status: watch::Sender::new(ProcessStatus::NotStarted),
            active,
            inner,
            child: None,
            started_at: None,
            exit_code: None,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Override the stop grace period.
    #[must_use]
    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    /// Unique process name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the kind that produced this process.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> ProcessStatus {
        *self.status.borrow()
    }

    /// Receiver observing status changes without locking the process.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProcessStatus> {
        self.status.subscribe()
    }

    fn set_status(&self, status: ProcessStatus) {
        self.status.send_replace(status);
    }

    /// Whether the process is started on registration.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// OS process id while running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Launch the process unless it is already running.
    ///
    /// A launch failure moves the process to `failed` and is reported in
    /// the returned outcome.
    pub async fn start(&mut self) -> LifecycleOutcome {
        let span = info_span!("start_process", name = %self.name, kind = %self.kind);
        async move {
            if !self.status().can_start() {
                info!("process is already running");
                return LifecycleOutcome::success(
                    &self.name,
                    LifecycleAction::Start,
                    self.status(),
                    format!("process '{}' is already running", self.name),
                );
            }

            self.inner.prepare().await;

            match self.inner.start() {
                Ok(child) => {
                    let pid = child.id();
                    self.child = Some(child);
                    self.started_at = Some(Utc::now());
                    self.exit_code = None;
                    self.set_status(ProcessStatus::Running);
                    info!(pid = pid.unwrap_or(0), "process started");
                    LifecycleOutcome::success(
                        &self.name,
                        LifecycleAction::Start,
                        ProcessStatus::Running,
                        format!(
                            "process '{}' started with pid {}",
                            self.name,
                            pid.unwrap_or(0)
                        ),
                    )
                }
                Err(err) => {
                    self.set_status(ProcessStatus::Failed);
                    error!(%err, "process failed to start");
                    LifecycleOutcome::failure(
                        &self.name,
                        LifecycleAction::Start,
                        ProcessStatus::Failed,
                        format!("process '{}' failed to start: {err}", self.name),
                    )
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Terminate the process if it is running.
    ///
    /// Stopping a process that is not running is a no-op. A termination
    /// failure or timeout moves the process to `error`.
    pub async fn stop(&mut self) -> LifecycleOutcome {
        let span = info_span!("stop_process", name = %self.name, kind = %self.kind);
        async move {
            let status = self.status();
            if !status.can_stop() {
                info!(%status, "process is not running, nothing to stop");
                return LifecycleOutcome::success(
                    &self.name,
                    LifecycleAction::Stop,
                    status,
                    format!("process '{}' is not running", self.name),
                );
            }

            let Some(mut child) = self.child.take() else {
                warn!("running process has no child handle");
                self.set_status(ProcessStatus::Stopped);
                return LifecycleOutcome::success(
                    &self.name,
                    LifecycleAction::Stop,
                    ProcessStatus::Stopped,
                    format!("process '{}' stopped", self.name),
                );
            };

            match self.inner.stop(&mut child, self.stop_timeout).await {
                Ok(()) => {
                    self.exit_code = child.try_wait().ok().flatten().and_then(|s| s.code());
                    self.set_status(ProcessStatus::Stopped);
                    info!("process terminated");
                    LifecycleOutcome::success(
                        &self.name,
                        LifecycleAction::Stop,
                        ProcessStatus::Stopped,
                        format!("process '{}' stopped", self.name),
                    )
                }
                Err(err) => {
                    self.set_status(ProcessStatus::Error);
                    error!(%err, "process failed to terminate");
                    LifecycleOutcome::failure(
                        &self.name,
                        LifecycleAction::Stop,
                        ProcessStatus::Error,
                        format!("process '{}' failed to terminate: {err}", self.name),
                    )
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Check whether a running child exited on its own.
    ///
    /// Returns `true` when the process moved from `running` to `stopped`.
    pub fn poll_exit(&mut self) -> bool {
        if self.status() != ProcessStatus::Running {
            return false;
        }
        let Some(child) = self.child.as_mut() else {
            return false;
        };

        match child.try_wait() {
            Ok(Some(exit)) => {
                self.exit_code = exit.code();
                self.child = None;
                self.set_status(ProcessStatus::Stopped);
                info!(name = %self.name, ?exit, "process exited on its own");
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!(name = %self.name, %err, "failed to poll child process status");
                false
            }
        }
    }

    /// Read-only snapshot of the process.
    #[must_use]
    pub fn describe(&self) -> ProcessDescription {
        ProcessDescription {
            name: self.name.clone(),
            kind: self.kind.clone(),
            status: self.status(),
            active: self.active,
            pid: self.pid(),
            started_at: self.started_at,
            exit_code: self.exit_code,
            details: kind_details(self.inner.describe()),
        }
    }
}

/// Fields every description carries; kind details never override them.
const DESCRIPTION_FIELDS: &[&str] = &[
    "name",
    "kind",
    "status",
    "active",
    "pid",
    "started_at",
    "exit_code",
];

fn kind_details(mut details: ProcessConfig) -> ProcessConfig {
    details.retain(|key, _| !DESCRIPTION_FIELDS.contains(&key.as_str()));
    details
}
