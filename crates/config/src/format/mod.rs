//! File format decoding.
//!
//! Responsibilities:
//! - Define the `Unmarshaler` capability implemented by each file format.
//! - Decode a byte buffer onto an existing configuration target (`unmarshal`).
//! - Provide the built-in JSON, YAML and TOML formats and the format registry.
//!
//! Does NOT handle:
//! - Reading files from disk (see `loader`).
//! - Environment variable overrides (see `bind.rs`).
//!
//! Invariants:
//! - Empty input is always a decode error, never "use the current values".
//! - The decoded document root must be a map.
//! - Fields absent from the input keep their prior value.
//! - A failed decode leaves the target untouched.

mod document;
mod json;
mod merge;
mod registry;
mod toml;
mod yaml;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ConfigError;

use self::document::Document;

pub use self::json::JsonFormat;
pub use self::registry::{FormatRegistry, default_registry, discriminator_for, register_format};
pub use self::toml::TomlFormat;
pub use self::yaml::YamlFormat;

/// Decodes raw bytes of one file format into a generic document tree.
pub trait Unmarshaler: Send + Sync {
    /// Short format name used in error messages (e.g. "json").
    fn format_name(&self) -> &'static str;

    /// Decode `bytes` into a document tree.
    ///
    /// Implementations must reject empty and malformed input.
    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, ConfigError>;
}

impl std::fmt::Debug for dyn Unmarshaler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Unmarshaler")
            .field(&self.format_name())
            .finish()
    }
}

/// Decode `bytes` with `unmarshaler` and apply the result onto `target`.
///
/// # Errors
///
/// - `ConfigError::InvalidTarget` if `T` does not serialize to a map of fields.
/// - `ConfigError::Decode` if the input is empty, malformed, not a map at its
///   root, or does not match the shape of `T`.
pub fn unmarshal<T>(
    unmarshaler: &dyn Unmarshaler,
    bytes: &[u8],
    target: &mut T,
) -> Result<(), ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    let current = target_document(&*target)?;
    apply_document(unmarshaler, bytes, current, target)
}

/// Snapshot the target and check it has named fields or map entries.
pub(crate) fn target_document<T: Serialize>(target: &T) -> Result<Document, ConfigError> {
    let type_name = std::any::type_name::<T>();
    let document = Document::from_serialize(target).map_err(|e| ConfigError::InvalidTarget {
        type_name,
        reason: e.to_string(),
    })?;

    if !document.is_keyed() {
        return Err(ConfigError::InvalidTarget {
            type_name,
            reason: "target must be a struct with named fields".to_string(),
        });
    }
    Ok(document)
}

/// Decode `bytes`, merge them onto `current` and replace `target` with the result.
///
/// `target` is only written once the merged document deserializes cleanly.
pub(crate) fn apply_document<T: DeserializeOwned>(
    unmarshaler: &dyn Unmarshaler,
    bytes: &[u8],
    mut current: Document,
    target: &mut T,
) -> Result<(), ConfigError> {
    let format = unmarshaler.format_name();

    if bytes.is_empty() {
        return Err(ConfigError::decode(format, "input is empty"));
    }

    let decoded = unmarshaler.decode(bytes)?;
    if !decoded.is_object() {
        return Err(ConfigError::decode(
            format,
            "document root must be a map of fields",
        ));
    }

    merge::merge_document(&mut current, decoded);
    *target = T::deserialize(current).map_err(|e| ConfigError::decode(format, e))?;
    Ok(())
}
