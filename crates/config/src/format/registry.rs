//! Registry mapping file discriminators to unmarshalers.
//!
//! Responsibilities:
//! - Map a discriminator (file extension with its leading dot) to an `Unmarshaler`.
//! - Derive discriminators from file paths.
//! - Hold the process-wide default registry, pre-populated with the built-in formats.
//!
//! Does NOT handle:
//! - Decoding (see the format modules).
//!
//! Invariants:
//! - Registering an existing discriminator replaces the previous unmarshaler.
//! - Discriminators match case-sensitively.
//! - The default registry is guarded by a single lock; readers take snapshots.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::{JsonFormat, TomlFormat, Unmarshaler, YamlFormat};
use crate::constants::{JSON_DISCRIMINATOR, TOML_DISCRIMINATOR, YAML_DISCRIMINATORS};
use crate::error::ConfigError;

/// Maps discriminators to unmarshalers.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: HashMap<String, Arc<dyn Unmarshaler>>,
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("discriminators", &self.discriminators())
            .finish()
    }
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with JSON (`.json`), YAML (`.yaml`, `.yml`) and TOML (`.toml`).
    pub fn with_builtin_formats() -> Self {
        let mut registry = Self::new();
        registry.register(JSON_DISCRIMINATOR, JsonFormat);
        for discriminator in YAML_DISCRIMINATORS {
            registry.register(*discriminator, YamlFormat);
        }
        registry.register(TOML_DISCRIMINATOR, TomlFormat);
        registry
    }

    /// Register `unmarshaler` for `discriminator`, replacing any previous registration.
    pub fn register(
        &mut self,
        discriminator: impl Into<String>,
        unmarshaler: impl Unmarshaler + 'static,
    ) {
        self.register_shared(discriminator, Arc::new(unmarshaler));
    }

    /// Register an already shared unmarshaler.
    pub fn register_shared(
        &mut self,
        discriminator: impl Into<String>,
        unmarshaler: Arc<dyn Unmarshaler>,
    ) {
        self.formats.insert(discriminator.into(), unmarshaler);
    }

    /// Look up the unmarshaler registered for `discriminator`.
    pub fn lookup(&self, discriminator: &str) -> Result<Arc<dyn Unmarshaler>, ConfigError> {
        self.formats
            .get(discriminator)
            .cloned()
            .ok_or_else(|| ConfigError::UnsupportedFormat {
                discriminator: discriminator.to_string(),
                path: None,
            })
    }

    /// Look up the unmarshaler for a file path's extension.
    pub fn resolve(&self, path: &Path) -> Result<Arc<dyn Unmarshaler>, ConfigError> {
        let discriminator = discriminator_for(path).unwrap_or_default();
        self.formats
            .get(&discriminator)
            .cloned()
            .ok_or_else(|| ConfigError::UnsupportedFormat {
                discriminator,
                path: Some(path.to_path_buf()),
            })
    }

    /// Whether `discriminator` has a registered unmarshaler.
    pub fn contains(&self, discriminator: &str) -> bool {
        self.formats.contains_key(discriminator)
    }

    /// Registered discriminators, sorted.
    pub fn discriminators(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.formats.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// The discriminator for `path`: its extension with a leading dot.
///
/// Returns None when the path has no extension.
pub fn discriminator_for(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

fn global() -> &'static RwLock<FormatRegistry> {
    static REGISTRY: OnceLock<RwLock<FormatRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(FormatRegistry::with_builtin_formats()))
}

/// Register a format in the process-wide default registry.
///
/// Intended for program initialization; loaders created afterwards see it.
pub fn register_format(discriminator: impl Into<String>, unmarshaler: impl Unmarshaler + 'static) {
    let discriminator = discriminator.into();
    tracing::debug!(
        discriminator = %discriminator,
        format = unmarshaler.format_name(),
        "Registering configuration format"
    );
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(discriminator, unmarshaler);
}

/// A snapshot of the process-wide default registry.
pub fn default_registry() -> FormatRegistry {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FixedFormat(&'static str);

    impl Unmarshaler for FixedFormat {
        fn format_name(&self) -> &'static str {
            self.0
        }

        fn decode(&self, _bytes: &[u8]) -> Result<serde_json::Value, ConfigError> {
            Ok(serde_json::json!({}))
        }
    }

    #[test]
    fn test_builtin_formats_are_registered() {
        let registry = FormatRegistry::with_builtin_formats();
        assert_eq!(
            registry.discriminators(),
            vec![".json", ".toml", ".yaml", ".yml"]
        );
        assert_eq!(registry.lookup(".yml").unwrap().format_name(), "yaml");
    }

    #[test]
    fn test_lookup_unknown_discriminator() {
        let registry = FormatRegistry::with_builtin_formats();
        let err = registry.lookup(".xml").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedFormat { ref discriminator, path: None } if discriminator == ".xml"
        ));
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = FormatRegistry::new();
        registry.register(".conf", FixedFormat("first"));
        registry.register(".conf", FixedFormat("second"));
        assert_eq!(registry.lookup(".conf").unwrap().format_name(), "second");
    }

    #[test]
    fn test_discriminators_are_case_sensitive() {
        let registry = FormatRegistry::with_builtin_formats();
        assert!(registry.resolve(Path::new("config.json")).is_ok());
        assert!(registry.resolve(Path::new("CONFIG.JSON")).is_err());
    }

    #[test]
    fn test_resolve_without_extension() {
        let registry = FormatRegistry::with_builtin_formats();
        let err = registry.resolve(Path::new("Makefile")).unwrap_err();
        match err {
            ConfigError::UnsupportedFormat {
                discriminator,
                path,
            } => {
                assert!(discriminator.is_empty());
                assert_eq!(path, Some(PathBuf::from("Makefile")));
            }
            other => panic!("expected UnsupportedFormat, got {other}"),
        }
    }

    #[test]
    fn test_discriminator_for_uses_last_extension() {
        assert_eq!(
            discriminator_for(Path::new("app.prod.yaml")),
            Some(".yaml".to_string())
        );
        assert_eq!(discriminator_for(Path::new(".env")), None);
    }

    #[test]
    fn test_register_format_updates_default_registry() {
        register_format(".registry-test", FixedFormat("custom"));
        let registry = default_registry();
        assert!(registry.contains(".registry-test"));
        assert!(registry.contains(".json"));
    }
}
