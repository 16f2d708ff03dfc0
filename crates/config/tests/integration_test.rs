//! Integration tests for the public layercfg API.
//!
//! These tests exercise the crate the way an embedding application does:
//! deriving `EnvBind` on its own configuration types and calling the
//! loader entrypoints from outside the crate.

use std::collections::HashMap;
use std::sync::Arc;

use layercfg::{
    ConfigError, ConfigLoader, EnvBind, EnvSource, FieldShape, FormatRegistry, JsonFormat,
    Unmarshaler, env_var_or_none, unmarshal,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::TempDir;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, EnvBind)]
struct DatabaseConfig {
    #[env(var = "INTEG_DB_URL")]
    url: String,
    #[env(var = "INTEG_DB_TOKEN", secret)]
    token: String,
    #[env(var = "INTEG_DB_POOL")]
    pool: Option<u32>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
enum Mode {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, EnvBind)]
struct ServiceConfig {
    #[env(var = "INTEG_NAME")]
    name: String,
    #[env(var = "INTEG_TAGS")]
    tags: Vec<String>,
    #[env(var = "INTEG_DEBUG")]
    debug: bool,
    #[env(skip)]
    mode: Mode,
    #[env(nested)]
    database: DatabaseConfig,
    replica: Box<DatabaseConfig>,
    labels: HashMap<String, String>,
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn loader(pairs: &[(&str, &str)]) -> ConfigLoader {
    ConfigLoader::new()
        .with_env_source(env(pairs))
        .without_env_files()
}

/// Test that env_var_or_none is exported and callable from the crate root
#[test]
fn test_env_var_or_none_exported() {
    let _result: Option<String> = env_var_or_none("_LAYERCFG_INTEG_UNSET");
}

#[test]
fn test_derived_descriptors() {
    let fields = ServiceConfig::env_fields();
    let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
    assert_eq!(
        names,
        vec!["name", "tags", "debug", "mode", "database", "replica", "labels"]
    );

    assert!(matches!(fields[3].shape, FieldShape::Skipped));
    assert!(matches!(fields[4].shape, FieldShape::Nested(_)));
    assert!(matches!(fields[5].shape, FieldShape::Nested(_)));
    assert!(matches!(fields[6].shape, FieldShape::Skipped));
    assert_eq!(fields[1].type_name, "Vec<String>");
    assert_eq!(fields[0].env_var, Some("INTEG_NAME"));
}

#[test]
fn test_env_var_names_include_nested_and_boxed() {
    assert_eq!(
        ServiceConfig::env_var_names(),
        vec![
            "INTEG_NAME",
            "INTEG_TAGS",
            "INTEG_DEBUG",
            "INTEG_DB_URL",
            "INTEG_DB_TOKEN",
            "INTEG_DB_POOL",
            "INTEG_DB_URL",
            "INTEG_DB_TOKEN",
            "INTEG_DB_POOL",
        ]
    );
    assert_eq!(
        ServiceConfig::secret_env_var_names(),
        vec!["INTEG_DB_TOKEN", "INTEG_DB_TOKEN"]
    );
}

#[test]
fn test_bind_sets_every_kind_of_field() {
    let mut config = ServiceConfig::default();
    loader(&[
        ("INTEG_NAME", "billing"),
        ("INTEG_TAGS", "a, b ,c"),
        ("INTEG_DEBUG", "TRUE"),
        ("INTEG_DB_URL", "postgres://db"),
        ("INTEG_DB_POOL", "8"),
    ])
    .bind_env(&mut config)
    .unwrap();

    assert_eq!(config.name, "billing");
    assert_eq!(config.tags, vec!["a", "b", "c"]);
    assert!(config.debug);
    assert_eq!(config.mode, Mode::Development);
    assert_eq!(config.database.url, "postgres://db");
    assert_eq!(config.database.pool, Some(8));
    assert_eq!(config.replica.url, "postgres://db");
}

#[test]
fn test_parse_yaml_then_environment() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("service.yml");
    std::fs::write(
        &path,
        "name: orders\nmode: Production\ndatabase:\n  url: postgres://file\n  pool: 4\nlabels:\n  team: core\n",
    )
    .unwrap();

    let mut config = ServiceConfig::default();
    loader(&[("INTEG_DB_POOL", "16")])
        .parse(&path, &mut config)
        .unwrap();

    assert_eq!(config.name, "orders");
    assert_eq!(config.mode, Mode::Production);
    assert_eq!(config.database.url, "postgres://file");
    assert_eq!(config.database.pool, Some(16));
    assert_eq!(config.labels.get("team").map(String::as_str), Some("core"));
}

#[test]
fn test_parse_toml_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("service.toml");
    std::fs::write(
        &path,
        "name = \"inventory\"\ntags = [\"x\", \"y\"]\n\n[database]\nurl = \"postgres://toml\"\n",
    )
    .unwrap();

    let mut config = ServiceConfig::default();
    loader(&[]).parse(&path, &mut config).unwrap();

    assert_eq!(config.name, "inventory");
    assert_eq!(config.tags, vec!["x", "y"]);
    assert_eq!(config.database.url, "postgres://toml");
}

#[test]
fn test_secret_conversion_error_is_masked() {
    #[derive(Debug, Default, Serialize, Deserialize, EnvBind)]
    struct Pin {
        #[env(var = "INTEG_PIN", secret)]
        pin: u16,
    }

    let mut config = Pin::default();
    let err = loader(&[("INTEG_PIN", "s3cr3t")])
        .bind_env(&mut config)
        .unwrap_err();

    assert!(matches!(err, ConfigError::Conversion { .. }));
    assert!(!err.to_string().contains("s3cr3t"));
}

#[test]
fn test_unmarshal_with_explicit_format() {
    let mut config = ServiceConfig::default();
    unmarshal(
        &JsonFormat,
        br#"{"name":"direct","database":{"url":"mysql://x"}}"#,
        &mut config,
    )
    .unwrap();

    assert_eq!(config.name, "direct");
    assert_eq!(config.database.url, "mysql://x");
}

/// Upper-cases every string value found in a JSON document.
struct ShoutingJson;

impl Unmarshaler for ShoutingJson {
    fn format_name(&self) -> &'static str {
        "shouting-json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, ConfigError> {
        let mut value = JsonFormat.decode(bytes)?;
        shout(&mut value);
        Ok(value)
    }
}

fn shout(value: &mut Value) {
    match value {
        Value::String(s) => *s = s.to_uppercase(),
        Value::Array(items) => items.iter_mut().for_each(shout),
        Value::Object(map) => map.values_mut().for_each(shout),
        _ => {}
    }
}

#[test]
fn test_custom_format_on_private_registry() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("service.loud");
    std::fs::write(&path, r#"{"name":"quiet"}"#).unwrap();

    let mut registry = FormatRegistry::with_builtin_formats();
    registry.register_shared(".loud", Arc::new(ShoutingJson));

    let mut config = ServiceConfig::default();
    loader(&[])
        .with_registry(registry)
        .parse(&path, &mut config)
        .unwrap();

    assert_eq!(config.name, "QUIET");
}

#[test]
fn test_custom_env_source() {
    struct Prefixed;

    impl EnvSource for Prefixed {
        fn var(&self, key: &str) -> Option<String> {
            key.strip_prefix("INTEG_").map(|rest| rest.to_lowercase())
        }
    }

    let mut config = ServiceConfig::default();
    let result = ConfigLoader::new()
        .with_env_source(Prefixed)
        .without_env_files()
        .bind_env(&mut config);
    // INTEG_DEBUG resolves to "debug", which is not a bool.
    assert!(matches!(result, Err(ConfigError::Conversion { ref var, .. }) if var == "INTEG_DEBUG"));
    assert_eq!(config.name, "name");
    assert_eq!(config.tags, vec!["tags"]);
}
