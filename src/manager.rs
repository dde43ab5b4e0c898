//! Process manager: owns the named processes and coordinates lifecycle
//! requests from control surfaces.
//!
//! The name index sits behind one coarse lock held only for lookup and
//! insertion. Each process has its own lock, so a slow `stop` on one
//! process never blocks lifecycle calls on another. Status reads go through
//! a watch channel per process and never wait on a process lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::models::{LifecycleOutcome, ProcessDescription, ProcessStatus};
use crate::process::ManagedProcess;
use crate::{AppError, Result};

/// A process shared between the manager and in-flight lifecycle calls.
pub type SharedProcess = Arc<Mutex<ManagedProcess>>;

/// A registered process and its status feed.
#[derive(Debug)]
struct Entry {
    process: SharedProcess,
    status: watch::Receiver<ProcessStatus>,
}

/// Owns every registered process, keyed by name.
#[derive(Debug, Default)]
pub struct ProcessManager {
    processes: Mutex<HashMap<String, Entry>>,
}

impl ProcessManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `process` under its name, replacing any process already
    /// registered with that name.
    ///
    /// Active processes are started immediately; the returned outcome
    /// reports that start. Start failures only show up in the outcome and
    /// the process status.
    pub async fn register(&self, process: ManagedProcess) -> Option<LifecycleOutcome> {
        let name = process.name().to_owned();
        let active = process.is_active();
        let status = process.subscribe();
        let shared = Arc::new(Mutex::new(process));

        {
            let mut processes = self.processes.lock().await;
            let entry = Entry {
                process: Arc::clone(&shared),
                status,
            };
            if processes.insert(name.clone(), entry).is_some() {
                warn!(%name, "process replaced an existing registration with the same name");
            }
        }
        info!(%name, active, "process registered");

        if active {
            Some(shared.lock().await.start().await)
        } else {
            None
        }
    }

    /// Start the named process.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no process has that name.
    pub async fn start(&self, name: &str) -> Result<LifecycleOutcome> {
        let process = self.get(name).await?;
        let outcome = process.lock().await.start().await;
        Ok(outcome)
    }

    /// Stop the named process.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no process has that name.
    pub async fn stop(&self, name: &str) -> Result<LifecycleOutcome> {
        let process = self.get(name).await?;
        let outcome = process.lock().await.stop().await;
        Ok(outcome)
    }

    /// Snapshot of the named process.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no process has that name.
    pub async fn describe(&self, name: &str) -> Result<ProcessDescription> {
        let process = self.get(name).await?;
        let description = process.lock().await.describe();
        Ok(description)
    }

    /// Names of every registered process, in lexical order.
    pub async fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.processes.lock().await.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Whether a process with `name` is registered.
    pub async fn contains(&self, name: &str) -> bool {
        self.processes.lock().await.contains_key(name)
    }

    /// Current status of every registered process.
    ///
    /// Answers immediately even while a start or stop is in progress.
    pub async fn status(&self) -> BTreeMap<String, ProcessStatus> {
        self.processes
            .lock()
            .await
            .iter()
            .map(|(name, entry)| (name.clone(), *entry.status.borrow()))
            .collect()
    }

    /// Start every process. Each start is independent of the others.
    pub async fn start_all(&self) -> Vec<LifecycleOutcome> {
        let processes = self.snapshot().await;
        join_all(
            processes
                .iter()
                .map(|(_, process)| async move { process.lock().await.start().await }),
        )
        .await
    }

    /// Stop every process. Each stop is independent of the others.
    pub async fn stop_all(&self) -> Vec<LifecycleOutcome> {
        let processes = self.snapshot().await;
        join_all(
            processes
                .iter()
                .map(|(_, process)| async move { process.lock().await.stop().await }),
        )
        .await
    }

    /// Move running processes whose OS-level unit exited to `stopped`.
    ///
    /// Returns the names of processes that changed state.
    pub async fn reap_exited(&self) -> Vec<String> {
        let mut exited = Vec::new();
        for (name, process) in self.snapshot().await {
            // Skip processes busy in another lifecycle call.
            let Ok(mut guard) = process.try_lock() else {
                continue;
            };
            if guard.poll_exit() {
                exited.push(name);
            }
        }
        exited
    }

    async fn get(&self, name: &str) -> Result<SharedProcess> {
        let processes = self.processes.lock().await;
        processes.get(name).map(|entry| Arc::clone(&entry.process)).ok_or_else(|| {
            warn!(%name, "no process with this name");
            AppError::NotFound(format!("process '{name}' not found"))
        })
    }

    /// Clone the index so per-process locks are taken without holding the
    /// index lock.
    async fn snapshot(&self) -> Vec<(String, SharedProcess)> {
        let processes = self.processes.lock().await;
        let mut entries: Vec<(String, SharedProcess)> = processes
            .iter()
            .map(|(name, entry)| (name.clone(), Arc::clone(&entry.process)))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
