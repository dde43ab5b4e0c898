#![forbid(unsafe_code)]

//! Declarative process supervisor.
//!
//! Process kinds are registered in a [`registry::KindRegistry`], a YAML
//! document tagged with `!Kind` is turned into managed processes by
//! [`resolver::ConfigResolver`], and a [`manager::ProcessManager`] drives
//! their lifecycle on behalf of the HTTP and IPC control surfaces.

pub mod config;
pub mod environment;
pub mod errors;
pub mod http;
pub mod ipc;
pub mod manager;
pub mod models;
pub mod monitor;
pub mod process;
pub mod registry;
pub mod resolver;

pub use config::SupervisorConfig;
pub use errors::{AppError, Result};
