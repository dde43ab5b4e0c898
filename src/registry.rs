//! Process kind registry.
//!
//! Maps a kind name (the `!Tag` used in the process document) to a factory
//! producing an uninitialized instance of that kind. Kinds are registered
//! explicitly at startup, before any document is resolved.

use std::collections::HashMap;

use tracing::debug;

use crate::process::{python, shell, streamlit, Process};
use crate::{AppError, Result};

/// Produces an empty, uninitialized instance of a kind.
pub type ProcessFactory = fn() -> Box<dyn Process>;

/// Mapping from kind name to factory.
#[derive(Debug, Default, Clone)]
pub struct KindRegistry {
    kinds: HashMap<String, ProcessFactory>,
}

impl KindRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in kind.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateKind`] if two built-in kinds share a name.
    pub fn with_builtin_kinds() -> Result<Self> {
        let mut registry = Self::new();
        register_builtin_kinds(&mut registry)?;
        Ok(registry)
    }

    /// Register a kind under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateKind`] if `name` is already registered.
    pub fn register(&mut self, name: &str, factory: ProcessFactory) -> Result<()> {
        if self.kinds.contains_key(name) {
            return Err(AppError::DuplicateKind(format!(
                "kind '{name}' is already registered"
            )));
        }
        self.kinds.insert(name.to_owned(), factory);
        debug!(kind = name, "process kind registered");
        Ok(())
    }

    /// Look up the factory for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnknownKind`] if `name` is not registered.
    pub fn resolve(&self, name: &str) -> Result<ProcessFactory> {
        self.kinds
            .get(name)
            .copied()
            .ok_or_else(|| AppError::UnknownKind(format!("unknown process kind: {name}")))
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Registered kind names in lexical order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Register every kind shipped with the crate.
///
/// # Errors
///
/// Returns [`AppError::DuplicateKind`] if any of them is already present.
pub fn register_builtin_kinds(registry: &mut KindRegistry) -> Result<()> {
    python::register(registry)?;
    shell::register(registry)?;
    streamlit::register(registry)?;
    Ok(())
}
