//! Exit monitor: detects supervised processes that exit on their own.
//!
//! Periodically polls every running process. A process whose OS-level unit
//! has exited is moved to `stopped` with its exit code recorded. Nothing is
//! restarted.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::manager::ProcessManager;

/// Spawn a background task that polls `manager` every `interval` until
/// `cancel` fires.
#[must_use]
pub fn spawn_exit_monitor(
    manager: Arc<ProcessManager>,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("exit monitor shutting down");
                    break;
                }
                () = tokio::time::sleep(interval) => {}
            }

            let exited = manager.reap_exited().await;
            if !exited.is_empty() {
                info!(?exited, "processes exited on their own");
            }
        }
    })
}
