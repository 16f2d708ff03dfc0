//! TOML file format.

use super::Unmarshaler;
use crate::error::ConfigError;

/// Decodes TOML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl Unmarshaler for TomlFormat {
    fn format_name(&self) -> &'static str {
        "toml"
    }

    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, ConfigError> {
        if bytes.is_empty() {
            return Err(ConfigError::decode(self.format_name(), "input is empty"));
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ConfigError::decode(self.format_name(), e))?;
        ::toml::from_str(text).map_err(|e| ConfigError::decode(self.format_name(), e))
    }
}
