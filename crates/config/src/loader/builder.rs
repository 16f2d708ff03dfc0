//! Configuration loader builder implementation.
//!
//! Responsibilities:
//! - Provide a builder-pattern `ConfigLoader` holding the format registry,
//!   the environment source and the env file selection.
//! - Load a configuration file onto a target (`load_file`).
//! - Bind environment variables onto a target (`bind_env`).
//! - Run the two-phase file-then-environment sequence (`parse`).
//!
//! Does NOT handle:
//! - Decoding file contents (delegated to `format`).
//! - Parsing env files (delegated to dotenv.rs).
//!
//! Invariants / Assumptions:
//! - Environment variables take precedence over file values.
//! - An unset environment variable never erases a file value.
//! - A file failure aborts `parse` before any environment binding happens.
//! - The registry is a snapshot; later `register_format` calls do not affect
//!   an existing loader.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::dotenv::{EnvFiles, import_env_files};
use crate::bind::{Configuration, EnvBind};
use crate::env::{DotenvOverlay, EnvSource, ProcessEnv};
use crate::error::ConfigError;
use crate::format::{FormatRegistry, apply_document, default_registry, target_document};

/// Populates configuration targets from files and environment variables.
pub struct ConfigLoader {
    registry: FormatRegistry,
    env: Box<dyn EnvSource + Send + Sync>,
    env_files: EnvFiles,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("registry", &self.registry)
            .field("env_files", &self.env_files)
            .finish_non_exhaustive()
    }
}

impl ConfigLoader {
    /// Create a loader using the default format registry, the process
    /// environment and `.env` discovery.
    pub fn new() -> Self {
        Self {
            registry: default_registry(),
            env: Box::new(ProcessEnv),
            env_files: EnvFiles::Discover,
        }
    }

    /// Use a private format registry instead of the process-wide default.
    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Read variables from `env` instead of the process environment.
    pub fn with_env_source(mut self, env: impl EnvSource + Send + Sync + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Replace the env files imported before binding.
    ///
    /// Each file must exist; a missing file fails binding.
    pub fn with_env_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.env_files = EnvFiles::Explicit(files.into_iter().map(Into::into).collect());
        self
    }

    /// Do not import any env file.
    pub fn without_env_files(mut self) -> Self {
        self.env_files = EnvFiles::Disabled;
        self
    }

    /// The registry used to resolve file formats.
    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// The env file selection.
    pub fn env_files(&self) -> &EnvFiles {
        &self.env_files
    }

    /// Decode the file at `path` onto `target`.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidTarget` if `T` does not serialize to a map of
    ///   fields, checked before the path is looked at.
    /// - `ConfigError::InvalidPath` if `path` is empty or cannot be read.
    /// - `ConfigError::UnsupportedFormat` if no unmarshaler is registered for
    ///   the path's extension, whether or not the file exists.
    /// - Any error of the resolved unmarshaler, unchanged.
    pub fn load_file<T>(&self, path: impl AsRef<Path>, target: &mut T) -> Result<(), ConfigError>
    where
        T: Serialize + DeserializeOwned,
    {
        let current = target_document(&*target)?;
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidPath {
                path: PathBuf::new(),
                reason: "path is empty".to_string(),
            });
        }

        let unmarshaler = self.registry.resolve(path)?;
        let bytes = std::fs::read(path).map_err(|e| ConfigError::InvalidPath {
            path: path.to_path_buf(),
            reason: e.kind().to_string(),
        })?;

        tracing::debug!(
            path = %path.display(),
            format = unmarshaler.format_name(),
            bytes = bytes.len(),
            "Loading configuration file"
        );
        apply_document(unmarshaler.as_ref(), &bytes, current, target)
    }

    /// Import the configured env files and bind environment variables onto `target`.
    ///
    /// Variables from the environment source win over env file values.
    pub fn bind_env<T: EnvBind>(&self, target: &mut T) -> Result<(), ConfigError> {
        let imported: HashMap<String, String> = import_env_files(&self.env_files)?;
        let source = DotenvOverlay::new(self.env.as_ref(), &imported);
        target.bind_env(&source)
    }

    /// Populate `target` from the file at `path` (skipped when `path` is
    /// empty), then override it with environment variables.
    ///
    /// A file failure aborts before the environment is consulted. A target
    /// without named fields is rejected even when no file is given.
    pub fn parse<T: Configuration>(
        &self,
        path: impl AsRef<Path>,
        target: &mut T,
    ) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            target_document(&*target)?;
        } else {
            self.load_file(path, target)?;
        }
        self.bind_env(target)
    }
}
