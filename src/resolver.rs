//! Process document resolution.
//!
//! A process document is a YAML mapping from process name to a tagged
//! entry. The tag names a kind registered in [`KindRegistry`]; the body is
//! either a scalar shorthand or a mapping:
//!
//! ```yaml
//! api: !PythonProcess
//!   target: /srv/api/main.py
//!   args: [--port, 8080]
//!   kwargs:
//!     cwd: /srv/api
//! worker: !ShellProcess "command='make worker' active=false"
//! ```
//!
//! Every tagged node is resolved while the document tree is walked: the
//! factory builds an empty instance, then [`Process::initialize`] receives
//! the payload built from the body.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, info_span};

use crate::manager::ProcessManager;
use crate::process::supervised::DEFAULT_STOP_TIMEOUT;
use crate::process::{optional_string, ManagedProcess, Process, ProcessConfig};
use crate::registry::KindRegistry;
use crate::{AppError, Result};

/// Payload key collecting positional shorthand tokens.
pub const ARGS_KEY: &str = "args";

/// Resolved processes keyed by their document entry name.
pub type ResolvedProcesses = BTreeMap<String, ManagedProcess>;

/// An initialized kind instance together with the fields every kind shares.
#[derive(Debug)]
struct ResolvedEntry {
    kind: String,
    name: Option<String>,
    active: bool,
    config: ProcessConfig,
    instance: Box<dyn Process>,
}

/// Resolves process documents against a kind registry.
#[derive(Debug, Clone)]
pub struct ConfigResolver<'a> {
    registry: &'a KindRegistry,
    stop_timeout: Duration,
}

impl<'a> ConfigResolver<'a> {
    /// Create a resolver using `registry` for tag lookup.
    #[must_use]
    pub fn new(registry: &'a KindRegistry) -> Self {
        Self {
            registry,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Stop grace period given to every resolved process.
    #[must_use]
    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    /// Read and resolve a process document from disk.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or is not valid
    /// YAML, or any resolution error described on [`parse_str`](Self::parse_str).
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ResolvedProcesses> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            AppError::Config(format!(
                "failed to read process document {}: {err}",
                path.display()
            ))
        })?;
        self.parse_str(&raw)
    }

    /// Resolve a process document held in memory.
    ///
    /// An empty document resolves to no processes.
    ///
    /// # Errors
    ///
    /// - `AppError::Config`: the text is not valid YAML.
    /// - `AppError::UnknownKind`: a tag names an unregistered kind.
    /// - `AppError::UnsupportedConfigShape`: a tagged body is a sequence.
    /// - `AppError::InvalidConfig`: a kind rejected its payload.
    /// - `AppError::InvalidProcessEntry`: a top-level value is not a
    ///   tagged process entry.
    pub fn parse_str(&self, raw: &str) -> Result<ResolvedProcesses> {
        let span = info_span!("resolve_document");
        let _guard = span.enter();

        let entries = match serde_yaml::from_str::<Value>(raw)? {
            Value::Null => return Ok(ResolvedProcesses::new()),
            Value::Mapping(entries) => entries,
            other => {
                return Err(AppError::InvalidProcessEntry(format!(
                    "process document must map names to processes, got a {}",
                    node_shape(&other)
                )))
            }
        };

        let mut processes = ResolvedProcesses::new();
        for (key, value) in entries {
            let key = match key {
                Value::String(key) => key,
                other => {
                    return Err(AppError::InvalidProcessEntry(format!(
                        "process names must be strings, got a {}",
                        node_shape(&other)
                    )))
                }
            };

            let tagged = match value {
                Value::Tagged(tagged) => tagged,
                other => {
                    return Err(AppError::InvalidProcessEntry(format!(
                        "process {key} did not produce a valid process instance: \
                         expected a !Kind tag, got a {}",
                        node_shape(&other)
                    )))
                }
            };

            let entry = self
                .resolve_tagged(*tagged)
                .map_err(|err| in_entry(&key, err))?;
            let name = entry.name.unwrap_or_else(|| key.clone());
            debug!(entry = %key, %name, kind = %entry.kind, "process entry resolved");

            let process = ManagedProcess::new(name, entry.kind, entry.active, entry.instance)
                .with_stop_timeout(self.stop_timeout);
            processes.insert(key, process);
        }

        info!(count = processes.len(), "process document resolved");
        Ok(processes)
    }

    /// Resolve the document at `path` and register every process into a
    /// fresh manager. Active processes are started during registration.
    ///
    /// # Errors
    ///
    /// Returns any error of [`parse_file`](Self::parse_file); lifecycle
    /// failures of active processes are reflected in their status instead.
    pub async fn init_process_manager(&self, path: impl AsRef<Path>) -> Result<ProcessManager> {
        let processes = self.parse_file(path)?;
        let manager = ProcessManager::new();
        for process in processes.into_values() {
            manager.register(process).await;
        }
        Ok(manager)
    }

    fn resolve_tagged(&self, tagged: TaggedValue) -> Result<ResolvedEntry> {
        let kind = kind_name(&tagged.tag);
        let factory = self.registry.resolve(&kind)?;
        let config = self.payload(&kind, tagged.value)?;

        let name = optional_string(&config, "name", &kind)?;
        let active = match config.get("active") {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::Bool(active)) => *active,
            Some(other) => {
                return Err(AppError::InvalidConfig(format!(
                    "{kind}: 'active' must be a boolean, got {other}"
                )))
            }
        };

        let mut instance = factory();
        instance.initialize(&config)?;

        Ok(ResolvedEntry {
            kind,
            name,
            active,
            config,
            instance,
        })
    }

    /// Build the configuration payload from a tagged node body.
    fn payload(&self, kind: &str, body: Value) -> Result<ProcessConfig> {
        match body {
            Value::Null => Ok(ProcessConfig::new()),
            Value::String(raw) => Ok(parse_shorthand(&raw)),
            Value::Number(n) => Ok(parse_shorthand(&n.to_string())),
            Value::Bool(b) => Ok(parse_shorthand(&b.to_string())),
            Value::Mapping(mapping) => self.mapping_to_config(kind, mapping),
            other @ (Value::Sequence(_) | Value::Tagged(_)) => {
                Err(AppError::UnsupportedConfigShape(format!(
                    "unsupported {} body for process kind {kind}",
                    node_shape(&other)
                )))
            }
        }
    }

    fn mapping_to_config(&self, kind: &str, mapping: Mapping) -> Result<ProcessConfig> {
        let mut config = ProcessConfig::new();
        for (key, value) in mapping {
            let key = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(AppError::InvalidConfig(format!(
                        "{kind}: configuration keys must be scalars, got a {}",
                        node_shape(&other)
                    )))
                }
            };
            let value = self.to_json(kind, value)?;
            config.insert(key, value);
        }
        Ok(config)
    }

    /// Convert a YAML node to a payload value, resolving nested tags.
    fn to_json(&self, kind: &str, value: Value) -> Result<serde_json::Value> {
        Ok(match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    serde_json::Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    serde_json::Value::from(u)
                } else {
                    n.as_f64()
                        .and_then(serde_json::Number::from_f64)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| {
                            AppError::InvalidConfig(format!(
                                "{kind}: number {n} cannot be represented"
                            ))
                        })?
                }
            }
            Value::String(s) => serde_json::Value::String(s),
            Value::Sequence(items) => serde_json::Value::Array(
                items
                    .into_iter()
                    .map(|item| self.to_json(kind, item))
                    .collect::<Result<_>>()?,
            ),
            Value::Mapping(mapping) => {
                serde_json::Value::Object(self.mapping_to_config(kind, mapping)?)
            }
            Value::Tagged(tagged) => {
                let nested = self.resolve_tagged(*tagged)?;
                serde_json::json!({ "kind": nested.kind, "config": nested.config })
            }
        })
    }
}

/// Kind name carried by a `!Kind` tag.
fn kind_name(tag: &Tag) -> String {
    tag.to_string().trim_start_matches('!').to_owned()
}

fn node_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Prefix a resolution error with the document entry it came from.
fn in_entry(key: &str, err: AppError) -> AppError {
    match err {
        AppError::UnknownKind(msg) => AppError::UnknownKind(format!("process {key}: {msg}")),
        AppError::InvalidConfig(msg) => AppError::InvalidConfig(format!("process {key}: {msg}")),
        AppError::UnsupportedConfigShape(msg) => {
            AppError::UnsupportedConfigShape(format!("process {key}: {msg}"))
        }
        AppError::InvalidProcessEntry(msg) => {
            AppError::InvalidProcessEntry(format!("process {key}: {msg}"))
        }
        other => other,
    }
}

/// Parse a scalar shorthand body into a configuration payload.
///
/// Tokens are separated by whitespace; quotes group whitespace into one
/// token. `key=value` tokens become entries with the value passed through
/// [`parse_literal`]; every other token is appended, in order, to the
/// [`ARGS_KEY`] list.
#[must_use]
pub fn parse_shorthand(raw: &str) -> ProcessConfig {
    let mut config = ProcessConfig::new();

    for token in tokenize(raw.trim()) {
        if let Some((key, value)) = token.split_once('=') {
            config.insert(key.to_owned(), parse_literal(value));
        } else {
            match config.get_mut(ARGS_KEY) {
                Some(serde_json::Value::Array(args)) => {
                    args.push(serde_json::Value::String(token));
                }
                _ => {
                    config.insert(
                        ARGS_KEY.to_owned(),
                        serde_json::Value::Array(vec![serde_json::Value::String(token)]),
                    );
                }
            }
        }
    }

    config
}

/// Interpret a shorthand value.
///
/// Tried in order: boolean (`true`/`false`, either capitalization), integer,
/// finite float, single- or double-quoted string (quotes removed). Anything
/// else is kept as the raw string.
#[must_use]
pub fn parse_literal(raw: &str) -> serde_json::Value {
    match raw {
        "true" | "True" => return serde_json::Value::Bool(true),
        "false" | "False" => return serde_json::Value::Bool(false),
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        return serde_json::Value::from(int);
    }

    if let Some(number) = raw
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        return serde_json::Value::Number(number);
    }

    if let Some(inner) = unquote(raw) {
        return serde_json::Value::String(inner.to_owned());
    }

    serde_json::Value::String(raw.to_owned())
}

fn unquote(raw: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|quote| {
        raw.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in raw.chars() {
        match quote {
            Some(open) => {
                current.push(ch);
                if ch == open {
                    quote = None;
                }
            }
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => {
                if ch == '\'' || ch == '"' {
                    quote = Some(ch);
                }
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
