//! Error types for configuration loading.
//!
//! Responsibilities:
//! - Define error variants for every failure of file loading, decoding,
//!   environment binding and `.env` import.
//! - Provide conversion from the type converter's `ConversionError`.
//!
//! Does NOT handle:
//! - Reporting errors to users (the embedding application decides).
//!
//! Invariants:
//! - All error variants include context for debugging (variable names, paths, formats).
//! - Env file errors NEVER include raw `.env` line contents to prevent secret leakage.
//! - Conversion errors carry a masked value when the bound field is marked secret.

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while populating a configuration target.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The target does not have the shape of a structured value.
    #[error("Invalid configuration target {type_name}: {reason}")]
    InvalidTarget {
        type_name: &'static str,
        reason: String,
    },

    /// The configuration file path is empty or does not name a readable file.
    #[error("Invalid configuration file path '{}': {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// No unmarshaler is registered for the discriminator.
    #[error("{}", unsupported_format_message(discriminator, path.as_ref()))]
    UnsupportedFormat {
        discriminator: String,
        path: Option<PathBuf>,
    },

    /// The file content is malformed, empty, or does not match the target.
    #[error("Failed to decode {format} configuration: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    /// An environment variable value is not representable in the field's type.
    #[error("Invalid value for {var}: {source}")]
    Conversion {
        var: String,
        #[source]
        source: crate::convert::ConversionError,
    },

    /// Failed to read a configured env file.
    #[error("Failed to read env file {}: {kind}", path.display())]
    EnvFileIo { path: PathBuf, kind: ErrorKind },

    /// Failed to parse an env file due to invalid syntax.
    ///
    /// SAFETY: This error only includes the byte index of the parse failure,
    /// NOT the offending line content, to prevent leaking secrets.
    #[error(
        "Failed to parse env file {} at position {error_index}. Hint: set DOTENV_DISABLED=1 to skip .env discovery",
        path.display()
    )]
    EnvFileParse { path: PathBuf, error_index: usize },

    /// Unknown env file error (future variants from dotenvy crate).
    ///
    /// SAFETY: This error does not include any raw env file content.
    #[error("Failed to load env file {}", path.display())]
    EnvFileUnknown { path: PathBuf },
}

impl ConfigError {
    /// Returns true for any of the env file import failures.
    pub fn is_env_file_error(&self) -> bool {
        matches!(
            self,
            ConfigError::EnvFileIo { .. }
                | ConfigError::EnvFileParse { .. }
                | ConfigError::EnvFileUnknown { .. }
        )
    }

    pub(crate) fn decode(format: &'static str, message: impl ToString) -> Self {
        ConfigError::Decode {
            format,
            message: message.to_string(),
        }
    }
}

fn unsupported_format_message(discriminator: &str, path: Option<&PathBuf>) -> String {
    let format = if discriminator.is_empty() {
        "<no extension>"
    } else {
        discriminator
    };
    match path {
        Some(path) => format!(
            "Unsupported configuration format {format} for file '{}'",
            path.display()
        ),
        None => format!("Unsupported configuration format {format}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message_names_path() {
        let err = ConfigError::UnsupportedFormat {
            discriminator: ".xml".to_string(),
            path: Some(PathBuf::from("config.xml")),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported configuration format .xml for file 'config.xml'"
        );
    }

    #[test]
    fn test_unsupported_format_message_without_extension() {
        let err = ConfigError::UnsupportedFormat {
            discriminator: String::new(),
            path: None,
        };
        assert_eq!(
            err.to_string(),
            "Unsupported configuration format <no extension>"
        );
    }

    #[test]
    fn test_env_file_errors_are_classified() {
        let io = ConfigError::EnvFileIo {
            path: PathBuf::from("sdf"),
            kind: ErrorKind::NotFound,
        };
        let parse = ConfigError::EnvFileParse {
            path: PathBuf::from(".env"),
            error_index: 3,
        };
        let decode = ConfigError::decode("json", "boom");

        assert!(io.is_env_file_error());
        assert!(parse.is_env_file_error());
        assert!(!decode.is_env_file_error());
    }
}
