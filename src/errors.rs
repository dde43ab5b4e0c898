//! Error types shared across the supervisor.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Settings or process document could not be read or parsed.
    Config(String),
    /// A configuration tag names a kind that is not registered.
    UnknownKind(String),
    /// A kind name was registered twice.
    DuplicateKind(String),
    /// A process payload is missing a required field or has a malformed one.
    InvalidConfig(String),
    /// A tagged node body is neither a scalar nor a mapping.
    UnsupportedConfigShape(String),
    /// A top-level document entry did not resolve to a process.
    InvalidProcessEntry(String),
    /// Requested process does not exist.
    NotFound(String),
    /// The OS-level unit could not be launched.
    StartFailure(String),
    /// The OS-level unit did not exit within the stop grace period.
    StopTimeout(String),
    /// HTTP control surface failure.
    Http(String),
    /// IPC communication failure.
    Ipc(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// Whether this error comes from resolving a malformed process document.
    ///
    /// Resolution errors abort startup; lifecycle errors never do.
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownKind(_)
                | Self::DuplicateKind(_)
                | Self::InvalidConfig(_)
                | Self::UnsupportedConfigShape(_)
                | Self::InvalidProcessEntry(_)
        )
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::UnknownKind(msg) => write!(f, "unknown kind: {msg}"),
            Self::DuplicateKind(msg) => write!(f, "duplicate kind: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::UnsupportedConfigShape(msg) => write!(f, "unsupported config shape: {msg}"),
            Self::InvalidProcessEntry(msg) => write!(f, "invalid process entry: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::StartFailure(msg) => write!(f, "start failure: {msg}"),
            Self::StopTimeout(msg) => write!(f, "stop timeout: {msg}"),
            Self::Http(msg) => write!(f, "http: {msg}"),
            Self::Ipc(msg) => write!(f, "ipc: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid settings: {err}"))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(format!("invalid process document: {err}"))
    }
}
