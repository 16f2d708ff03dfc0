//! Env file import.
//!
//! Responsibilities:
//! - Locate and parse `.env`-style files with `dotenvy`.
//! - Collect their `KEY=VALUE` pairs into an in-memory map for layering.
//! - Enforce the `DOTENV_DISABLED` gate for discovered files.
//!
//! Does NOT handle:
//! - Binding values to fields (see `bind.rs`).
//! - Mutating the process environment; imported values stay in memory.
//!
//! Invariants:
//! - A missing discovered `.env` file is silently ignored.
//! - A missing or malformed configured file is an error.
//! - The first file (and first line) defining a key wins.
//! - Errors NEVER include raw env file line contents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_ENV_FILE, DOTENV_DISABLED_VAR};
use crate::error::ConfigError;

/// Which env files the loader imports before binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvFiles {
    /// Search for `.env` in the working directory and its ancestors.
    #[default]
    Discover,
    /// Import exactly these files, in order; each must exist.
    Explicit(Vec<PathBuf>),
    /// Import nothing.
    Disabled,
}

/// Check if `.env` discovery is disabled via environment variable.
fn dotenv_disabled() -> bool {
    matches!(
        std::env::var(DOTENV_DISABLED_VAR).ok().as_deref(),
        Some("true") | Some("1")
    )
}

/// Import the configured env files into a key/value map.
pub(crate) fn import_env_files(files: &EnvFiles) -> Result<HashMap<String, String>, ConfigError> {
    let mut imported = HashMap::new();

    match files {
        EnvFiles::Disabled => {}
        EnvFiles::Discover => {
            if dotenv_disabled() {
                tracing::trace!("{DOTENV_DISABLED_VAR} is set, skipping .env discovery");
                return Ok(imported);
            }
            match find_env_file(Path::new(DEFAULT_ENV_FILE)) {
                Some(path) => read_env_file(&path, &mut imported)?,
                None => tracing::trace!("No .env file found, skipping import"),
            }
        }
        EnvFiles::Explicit(paths) => {
            for path in paths {
                read_env_file(path, &mut imported)?;
            }
        }
    }

    Ok(imported)
}

/// Find `name` in the working directory or the closest ancestor containing it.
fn find_env_file(name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut current_dir = cwd.as_path();
    loop {
        let candidate = current_dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current_dir = current_dir.parent()?;
    }
}

fn read_env_file(path: &Path, imported: &mut HashMap<String, String>) -> Result<(), ConfigError> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| map_dotenv_error(path, e))?;

    let mut count = 0usize;
    for item in iter {
        let (key, value) = item.map_err(|e| map_dotenv_error(path, e))?;
        imported.entry(key).or_insert(value);
        count += 1;
    }

    tracing::debug!(
        path = %path.display(),
        variables = count,
        "Imported env file"
    );
    Ok(())
}

/// SAFETY: the mapped errors never carry dotenvy's offending line text.
fn map_dotenv_error(path: &Path, error: dotenvy::Error) -> ConfigError {
    let path = path.to_path_buf();
    match error {
        dotenvy::Error::LineParse(_, error_index) => ConfigError::EnvFileParse { path, error_index },
        dotenvy::Error::Io(io_err) => ConfigError::EnvFileIo {
            path,
            kind: io_err.kind(),
        },
        _ => ConfigError::EnvFileUnknown { path },
    }
}
