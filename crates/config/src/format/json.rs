//! JSON file format.

use super::Unmarshaler;
use crate::error::ConfigError;

/// Decodes JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Unmarshaler for JsonFormat {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, ConfigError> {
        if bytes.is_empty() {
            return Err(ConfigError::decode(self.format_name(), "input is empty"));
        }
        serde_json::from_slice(bytes).map_err(|e| ConfigError::decode(self.format_name(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_object() {
        let value = JsonFormat
            .decode(br#"{"Port":3001,"Redis":{"Host":"localhost","Port":6379}}"#)
            .unwrap();
        assert_eq!(
            value,
            json!({"Port": 3001, "Redis": {"Host": "localhost", "Port": 6379}})
        );
    }

    #[test]
    fn test_decode_malformed_input() {
        let err = JsonFormat.decode(br#"{"Port":}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Decode { format: "json", .. }));
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(JsonFormat.decode(b"").is_err());
        assert!(JsonFormat.decode(b"   ").is_err());
    }
}
