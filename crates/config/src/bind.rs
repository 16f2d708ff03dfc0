//! Environment binding for configuration structs.
//!
//! Responsibilities:
//! - Define the `EnvBind` trait implemented by `#[derive(EnvBind)]`.
//! - Describe each field's binding with a static `FieldDescriptor`.
//! - Convert and assign a single annotated leaf field (`bind_leaf`).
//!
//! Does NOT handle:
//! - Env file import (see `loader/dotenv.rs`).
//! - File decoding (see `format`).
//!
//! Invariants:
//! - Fields are bound in declaration order, depth-first.
//! - An absent variable never changes the field.
//! - The first conversion failure aborts the bind; fields bound before it stay set.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::constants::SECRET_MASK;
use crate::convert::FromEnvStr;
use crate::env::EnvSource;
use crate::error::ConfigError;

/// How the binder treats a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldShape {
    /// Converted from the variable named by the descriptor.
    Leaf,
    /// A nested configuration; carries the nested type's descriptors.
    Nested(fn() -> &'static [FieldDescriptor]),
    /// Never touched by the binder.
    Skipped,
}

/// Static binding metadata for one struct field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Rust field name.
    pub name: &'static str,
    /// Declared type, as written in the struct.
    pub type_name: &'static str,
    /// Environment variable bound to this field, for leaves.
    pub env_var: Option<&'static str>,
    /// Whether the value must be masked in logs and errors.
    pub secret: bool,
    pub shape: FieldShape,
}

/// A configuration struct whose fields can be populated from environment variables.
///
/// Usually derived:
///
/// ```
/// use layercfg::EnvBind;
///
/// #[derive(EnvBind, Default)]
/// struct MysqlConfiguration {
///     #[env(var = "APP_MYSQL_HOST")]
///     host: String,
///     #[env(var = "APP_MYSQL_PASSWORD", secret)]
///     password: String,
/// }
///
/// #[derive(EnvBind, Default)]
/// struct Configuration {
///     #[env(var = "APP_PORT")]
///     port: u16,
///     mysql: MysqlConfiguration,
/// }
///
/// assert_eq!(
///     Configuration::env_var_names(),
///     vec!["APP_PORT", "APP_MYSQL_HOST", "APP_MYSQL_PASSWORD"]
/// );
/// ```
pub trait EnvBind {
    /// Descriptors for every field, in declaration order.
    fn env_fields() -> &'static [FieldDescriptor]
    where
        Self: Sized;

    /// Assign every present variable to its field, recursing into nested configurations.
    fn bind_env(&mut self, env: &dyn EnvSource) -> Result<(), ConfigError>;

    /// All bound variable names, including those of nested configurations.
    fn env_var_names() -> Vec<&'static str>
    where
        Self: Sized,
    {
        let mut names = Vec::new();
        collect_env_vars(Self::env_fields(), false, &mut names);
        names
    }

    /// Bound variable names for fields marked `secret`.
    fn secret_env_var_names() -> Vec<&'static str>
    where
        Self: Sized,
    {
        let mut names = Vec::new();
        collect_env_vars(Self::env_fields(), true, &mut names);
        names
    }
}

impl<T: EnvBind> EnvBind for Box<T> {
    fn env_fields() -> &'static [FieldDescriptor] {
        T::env_fields()
    }

    fn bind_env(&mut self, env: &dyn EnvSource) -> Result<(), ConfigError> {
        (**self).bind_env(env)
    }
}

fn collect_env_vars(
    fields: &'static [FieldDescriptor],
    secrets_only: bool,
    names: &mut Vec<&'static str>,
) {
    for field in fields {
        match field.shape {
            FieldShape::Leaf => {
                if let Some(var) = field.env_var
                    && (!secrets_only || field.secret)
                {
                    names.push(var);
                }
            }
            FieldShape::Nested(nested) => collect_env_vars(nested(), secrets_only, names),
            FieldShape::Skipped => {}
        }
    }
}

/// Types that can be both decoded from files and bound from the environment.
pub trait Configuration: EnvBind + Serialize + DeserializeOwned {}

impl<T: EnvBind + Serialize + DeserializeOwned> Configuration for T {}

/// Convert and assign one leaf field if its variable is present.
///
/// Called by derived `EnvBind` implementations.
pub fn bind_leaf<T: FromEnvStr>(
    slot: &mut T,
    field: &FieldDescriptor,
    env: &dyn EnvSource,
) -> Result<(), ConfigError> {
    let Some(var) = field.env_var else {
        return Ok(());
    };
    let Some(raw) = env.lookup(var) else {
        tracing::trace!(var, field = field.name, "Environment variable not set");
        return Ok(());
    };

    let value = T::from_env_str(&raw).map_err(|e| ConfigError::Conversion {
        var: var.to_string(),
        source: if field.secret { e.masked(SECRET_MASK) } else { e },
    })?;
    *slot = value;

    let display_value = if field.secret { SECRET_MASK } else { raw.as_str() };
    tracing::debug!(
        var,
        field = field.name,
        value = display_value,
        "Field set from environment variable"
    );
    Ok(())
}
