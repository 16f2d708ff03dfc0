//! Tests for the configuration loader builder.
//!
//! Responsibilities:
//! - Test file loading, format resolution and path validation.
//! - Test env file import (discovery, explicit files, `DOTENV_DISABLED`).
//! - Test environment binding and its precedence over file values.
//! - Test the two-phase `parse` sequence end to end.
//!
//! Invariants:
//! - Tests touching process-global state (cwd/env) use `serial_test` and `env_lock()`.
//! - Temporary directories are cleaned up automatically via `tempfile`.
//! - Tests that do not exercise env files disable them explicitly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, EnvBind, EnvSource, FieldDescriptor, FromEnvStr};


/// Returns the global test lock for environment variable isolation.
pub fn env_lock() -> &'static Mutex<()> {
    crate::test_util::global_test_lock()
}

pub const CONFIG_JSON: &str = r#"{"Port":3001,"Mysql":{"Host":"192.168.0.1","Username":"root","Password":"test","Database":"cnfgo","Port":3306},"Redis":{"Host":"localhost","Port":6379}}"#;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, EnvBind)]
pub struct MysqlConfiguration {
    #[env(var = "TEST_MYSQL_HOST")]
    pub host: String,
    #[env(var = "TEST_MYSQL_USERNAME")]
    pub username: String,
    #[env(var = "TEST_MYSQL_PASSWORD", secret)]
    pub password: String,
    #[env(var = "TEST_MYSQL_DATABASE")]
    pub database: String,
    #[env(var = "TEST_MYSQL_PORT")]
    pub port: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, EnvBind)]
pub struct RedisConfiguration {
    #[env(var = "TEST_REDIS_HOST")]
    pub host: String,
    #[env(var = "TEST_REDIS_PORT")]
    pub port: i64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, EnvBind)]
pub struct Configuration {
    #[env(var = "TEST_APP_PORT")]
    pub port: i64,
    pub mysql: MysqlConfiguration,
    pub redis: RedisConfiguration,
}

/// A target without named fields; binds `TEST_LISTEN_PORT` by hand.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenPort(pub u16);

impl EnvBind for ListenPort {
    fn env_fields() -> &'static [FieldDescriptor] {
        &[]
    }

    fn bind_env(&mut self, env: &dyn EnvSource) -> Result<(), ConfigError> {
        if let Some(raw) = env.lookup("TEST_LISTEN_PORT") {
            self.0 = u16::from_env_str(&raw).map_err(|source| ConfigError::Conversion {
                var: "TEST_LISTEN_PORT".to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

/// The configuration described by `CONFIG_JSON`.
pub fn expected_from_file() -> Configuration {
    Configuration {
        port: 3001,
        mysql: MysqlConfiguration {
            host: "192.168.0.1".to_string(),
            username: "root".to_string(),
            password: "test".to_string(),
            database: "cnfgo".to_string(),
            port: 3306,
        },
        redis: RedisConfiguration {
            host: "localhost".to_string(),
            port: 6379,
        },
    }
}

/// Every variable bound by `Configuration`.
pub fn all_test_vars() -> Vec<&'static str> {
    Configuration::env_var_names()
}

pub fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Write `contents` to `name` inside `dir` and return the full path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write test file");
    path
}
