//! Typed configuration loading for layercfg.
//!
//! This crate populates a configuration struct from a structured file
//! (JSON, YAML, TOML or any registered format) and then overrides it with
//! environment variables declared per field with `#[derive(EnvBind)]`.
//!
//! ```no_run
//! use layercfg::EnvBind;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize, EnvBind)]
//! struct MysqlConfiguration {
//!     #[env(var = "APP_MYSQL_HOST")]
//!     host: String,
//!     #[env(var = "APP_MYSQL_PASSWORD", secret)]
//!     password: String,
//! }
//!
//! #[derive(Debug, Default, Serialize, Deserialize, EnvBind)]
//! struct Configuration {
//!     #[env(var = "APP_PORT")]
//!     port: u16,
//!     mysql: MysqlConfiguration,
//! }
//!
//! let mut config = Configuration::default();
//! layercfg::parse("config.json", &mut config)?;
//! # Ok::<(), layercfg::ConfigError>(())
//! ```

extern crate self as layercfg;

pub mod bind;
pub mod constants;
pub mod convert;
pub mod env;
mod error;
pub mod format;
mod loader;

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use bind::{Configuration, EnvBind, FieldDescriptor, FieldShape, bind_leaf};
pub use convert::{ConversionError, FromEnvStr};
pub use env::{DotenvOverlay, EnvSource, ProcessEnv, env_var_or_none};
pub use error::ConfigError;
pub use format::{
    FormatRegistry, JsonFormat, TomlFormat, Unmarshaler, YamlFormat, default_registry,
    register_format, unmarshal,
};
pub use layercfg_derive::EnvBind;
pub use loader::{ConfigLoader, EnvFiles};

/// Populate `target` from the file at `path`, then from the environment.
///
/// Uses `ConfigLoader::default()`. An empty `path` skips the file phase.
pub fn parse<T: Configuration>(path: impl AsRef<Path>, target: &mut T) -> Result<(), ConfigError> {
    ConfigLoader::new().parse(path, target)
}

/// Populate `target` from the file at `path` using the default registry.
pub fn load_file<T>(path: impl AsRef<Path>, target: &mut T) -> Result<(), ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    ConfigLoader::new().load_file(path, target)
}

/// Populate `target` from `.env` discovery and the process environment.
pub fn bind_env<T: EnvBind>(target: &mut T) -> Result<(), ConfigError> {
    ConfigLoader::new().bind_env(target)
}
