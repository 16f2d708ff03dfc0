//! YAML file format.

use super::Unmarshaler;
use crate::error::ConfigError;

/// Decodes YAML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl Unmarshaler for YamlFormat {
    fn format_name(&self) -> &'static str {
        "yaml"
    }

    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, ConfigError> {
        if bytes.is_empty() {
            return Err(ConfigError::decode(self.format_name(), "input is empty"));
        }
        serde_yaml::from_slice(bytes).map_err(|e| ConfigError::decode(self.format_name(), e))
    }
}
