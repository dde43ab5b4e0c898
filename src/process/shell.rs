//! Shell-command kind.
//!
//! Runs a single command string through the platform shell. When no
//! `command` is configured, positional `args` are joined into one, so the
//! shorthand `!ShellProcess "make serve"` works.

use serde_json::Value;
use tokio::process::Child;

use super::{
    optional_string, shell_command, spawn, string_list, LaunchOptions, Process, ProcessConfig,
};
use crate::registry::KindRegistry;
use crate::{AppError, Result};

/// Registered kind name.
pub const KIND: &str = "ShellProcess";

/// A command string launched through the shell.
#[derive(Debug, Default)]
pub struct ShellProcess {
    command: String,
    launch: LaunchOptions,
}

impl ShellProcess {
    /// Factory registered for [`KIND`].
    #[must_use]
    pub fn factory() -> Box<dyn Process> {
        Box::<Self>::default()
    }
}

/// Register the kind.
///
/// # Errors
///
/// Returns [`AppError::DuplicateKind`] if the name is already taken.
pub fn register(registry: &mut KindRegistry) -> Result<()> {
    registry.register(KIND, ShellProcess::factory)
}

impl Process for ShellProcess {
    fn initialize(&mut self, config: &ProcessConfig) -> Result<()> {
        let command = match optional_string(config, "command", KIND)? {
            Some(command) => command,
            None => string_list(config, "args", KIND)?.join(" "),
        };
        if command.trim().is_empty() {
            return Err(AppError::InvalidConfig(format!(
                "{KIND}: missing required field 'command'"
            )));
        }

        self.command = command;
        self.launch = LaunchOptions::from_config(config, KIND)?;
        Ok(())
    }

    fn start(&mut self) -> Result<Child> {
        let mut cmd = shell_command(&self.command);
        self.launch.apply(&mut cmd);
        spawn(&mut cmd, KIND)
    }

    fn describe(&self) -> ProcessConfig {
        let mut info = ProcessConfig::new();
        info.insert("command".into(), Value::String(self.command.clone()));
        info
    }
}
