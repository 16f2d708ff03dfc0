//! Environment variable sources for binding.
//!
//! Responsibilities:
//! - Define the `EnvSource` lookup capability consumed by the binder.
//! - Provide the process environment source and in-memory map sources.
//! - Layer values imported from env files under a live source.
//!
//! Does NOT handle:
//! - Reading or parsing env files (see `loader/dotenv.rs`).
//! - Converting values into field types (see `convert.rs`).
//!
//! Invariants:
//! - Empty or whitespace-only values are treated as unset.
//! - Returned values are trimmed (leading/trailing whitespace removed).
//! - A value from the live source always wins over an env file value.

use std::collections::{BTreeMap, HashMap};

/// Read-only key/value lookup used to bind configuration fields.
pub trait EnvSource {
    /// Raw value for `key`, exactly as stored.
    fn var(&self, key: &str) -> Option<String>;

    /// Value for `key`, returning None if unset, empty, or whitespace-only.
    fn lookup(&self, key: &str) -> Option<String> {
        self.var(key).and_then(normalize)
    }
}

/// Trim a raw value and filter out empty results.
fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        // No trimming needed, return original to avoid allocation
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// Read a process environment variable, returning None if unset, empty, or
/// whitespace-only. Returns the trimmed value if present.
pub fn env_var_or_none(key: &str) -> Option<String> {
    ProcessEnv.lookup(key)
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<S: EnvSource + ?Sized> EnvSource for &S {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Values imported from env files, consulted only when the live source has no value.
pub struct DotenvOverlay<'a> {
    live: &'a dyn EnvSource,
    imported: &'a HashMap<String, String>,
}

impl<'a> DotenvOverlay<'a> {
    pub fn new(live: &'a dyn EnvSource, imported: &'a HashMap<String, String>) -> Self {
        Self { live, imported }
    }
}

impl EnvSource for DotenvOverlay<'_> {
    fn var(&self, key: &str) -> Option<String> {
        self.live.var(key).or_else(|| self.imported.get(key).cloned())
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.live
            .lookup(key)
            .or_else(|| self.imported.get(key).cloned().and_then(normalize))
    }
}
