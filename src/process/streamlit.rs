//! Streamlit app kind: a web-exposing script process.

use std::path::PathBuf;

use serde_json::Value;
use tokio::process::{Child, Command};

use super::{optional_string, required_string, spawn, Process, ProcessConfig};
use crate::environment::default_interpreter;
use crate::registry::KindRegistry;
use crate::{AppError, Result};

/// Registered kind name.
pub const KIND: &str = "StreamlitProcess";

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 9501;

/// A Streamlit app served by `python -m streamlit run`.
#[derive(Debug)]
pub struct StreamlitProcess {
    target: String,
    port: u16,
    host: String,
    interpreter_path: PathBuf,
}

impl Default for StreamlitProcess {
    fn default() -> Self {
        Self {
            target: String::new(),
            port: DEFAULT_PORT,
            host: "localhost".into(),
            interpreter_path: default_interpreter(),
        }
    }
}

impl StreamlitProcess {
    /// Factory registered for [`KIND`].
    #[must_use]
    pub fn factory() -> Box<dyn Process> {
        Box::<Self>::default()
    }

    /// Address the app is served on.
    #[must_use]
    pub fn link(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

/// Register the kind.
///
/// # Errors
///
/// Returns [`AppError::DuplicateKind`] if the name is already taken.
pub fn register(registry: &mut KindRegistry) -> Result<()> {
    registry.register(KIND, StreamlitProcess::factory)
}

impl Process for StreamlitProcess {
    fn initialize(&mut self, config: &ProcessConfig) -> Result<()> {
        self.target = required_string(config, "target", KIND)?;

        if let Some(port) = config.get("port").filter(|v| !v.is_null()) {
            self.port = port
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .ok_or_else(|| {
                    AppError::InvalidConfig(format!("{KIND}: 'port' must be a valid port, got {port}"))
                })?;
        }
        if let Some(host) = optional_string(config, "host", KIND)? {
            self.host = host;
        }
        if let Some(path) = optional_string(config, "interpreter_path", KIND)? {
            self.interpreter_path = PathBuf::from(path);
        }

        Ok(())
    }

    fn start(&mut self) -> Result<Child> {
        let mut cmd = Command::new(&self.interpreter_path);
        cmd.args(["-m", "streamlit", "run"])
            .arg(&self.target)
            .arg("--server.port")
            .arg(self.port.to_string())
            .arg("--server.address")
            .arg(&self.host)
            .args(["--server.headless", "true"]);
        spawn(&mut cmd, KIND)
    }

    fn describe(&self) -> ProcessConfig {
        let mut info = ProcessConfig::new();
        info.insert("target".into(), Value::String(self.target.clone()));
        info.insert("port".into(), Value::from(self.port));
        info.insert("host".into(), Value::String(self.host.clone()));
        info.insert(
            "interpreter_path".into(),
            Value::String(self.interpreter_path.to_string_lossy().into_owned()),
        );
        info.insert("link".into(), Value::String(self.link()));
        info
    }
}
