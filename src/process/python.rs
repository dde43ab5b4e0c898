//! Interpreter-launched script kind.
//!
//! Runs `<interpreter> <target> <args...>`. Launch options live under
//! `kwargs`; `interpreter_path` overrides the default interpreter when it
//! passes [`is_valid_interpreter`].

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use serde_json::Value;
use tokio::process::{Child, Command};
use tracing::warn;

use super::{required_string, spawn, string_list, LaunchOptions, Process, ProcessConfig};
use crate::environment::{default_interpreter, is_valid_interpreter};
use crate::registry::KindRegistry;
use crate::{AppError, Result};

/// Registered kind name.
pub const KIND: &str = "PythonProcess";

/// Launch options understood under `kwargs`.
const LAUNCH_OPTIONS: &[&str] = &["interpreter_path", "cwd", "env"];

/// A script launched through a Python interpreter.
#[derive(Debug, Default)]
pub struct PythonProcess {
    target: String,
    args: Vec<String>,
    kwargs: ProcessConfig,
    launch: LaunchOptions,
    interpreter: Option<PathBuf>,
}

impl PythonProcess {
    /// Factory registered for [`KIND`].
    #[must_use]
    pub fn factory() -> Box<dyn Process> {
        Box::<Self>::default()
    }

    /// Pick the interpreter for the next launch.
    async fn select_interpreter(&self) -> PathBuf {
        if let Some(path) = self.kwargs.get("interpreter_path").and_then(Value::as_str) {
            let candidate = PathBuf::from(path);
            if is_valid_interpreter(&candidate).await {
                return candidate;
            }
            warn!(
                interpreter_path = path,
                "interpreter override is not a valid interpreter, using default"
            );
        }
        default_interpreter()
    }
}

/// Register the kind.
///
/// # Errors
///
/// Returns [`AppError::DuplicateKind`] if the name is already taken.
pub fn register(registry: &mut KindRegistry) -> Result<()> {
    registry.register(KIND, PythonProcess::factory)
}

impl Process for PythonProcess {
    fn initialize(&mut self, config: &ProcessConfig) -> Result<()> {
        self.target = required_string(config, "target", KIND)?;
        self.args = string_list(config, "args", KIND)?;
        self.kwargs = match config.get("kwargs") {
            None | Some(Value::Null) => ProcessConfig::new(),
            Some(Value::Object(kwargs)) => kwargs.clone(),
            Some(other) => {
                return Err(AppError::InvalidConfig(format!(
                    "{KIND}: 'kwargs' must be a mapping, got {other}"
                )))
            }
        };

        if let Some(path) = self.kwargs.get("interpreter_path") {
            if !path.is_string() {
                return Err(AppError::InvalidConfig(format!(
                    "{KIND}: 'interpreter_path' must be a string, got {path}"
                )));
            }
        }
        self.launch = LaunchOptions::from_config(&self.kwargs, KIND)?;

        for key in self.kwargs.keys() {
            if !LAUNCH_OPTIONS.contains(&key.as_str()) {
                warn!(kind = KIND, option = %key, "unrecognized launch option is ignored");
            }
        }

        Ok(())
    }

    fn prepare(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.interpreter = Some(self.select_interpreter().await);
        })
    }

    fn start(&mut self) -> Result<Child> {
        let interpreter = self.interpreter.clone().unwrap_or_else(default_interpreter);
        let mut cmd = Command::new(interpreter);
        cmd.arg(&self.target).args(&self.args);
        self.launch.apply(&mut cmd);
        spawn(&mut cmd, KIND)
    }

    fn describe(&self) -> ProcessConfig {
        let mut info = ProcessConfig::new();
        info.insert("target".into(), Value::String(self.target.clone()));
        info.insert(
            "args".into(),
            Value::Array(self.args.iter().cloned().map(Value::String).collect()),
        );
        info.insert("kwargs".into(), Value::Object(self.kwargs.clone()));
        info
    }
}
