//! Conversion of textual environment values into typed field values.
//!
//! Responsibilities:
//! - Define the `FromEnvStr` trait implemented by every bindable leaf type.
//! - Provide implementations for strings, paths, integers, floats, booleans,
//!   characters, `Option<T>` and comma-separated `Vec<T>`.
//!
//! Does NOT handle:
//! - Looking up environment variables (see `env.rs`).
//! - Trimming or empty filtering (values arrive already normalized).
//!
//! Invariants:
//! - Malformed or out-of-range text is always an error, never a silent zero value.
//! - Conversions have no side effects.

use std::path::PathBuf;
use thiserror::Error;

/// A textual value that is not representable in the requested kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot convert '{value}' to {kind}: {reason}")]
pub struct ConversionError {
    /// The offending text (masked for secret fields).
    pub value: String,
    /// The destination type name.
    pub kind: &'static str,
    /// Why the conversion failed.
    pub reason: String,
}

impl ConversionError {
    pub fn new(value: &str, kind: &'static str, reason: impl ToString) -> Self {
        Self {
            value: value.to_string(),
            kind,
            reason: reason.to_string(),
        }
    }

    /// Replace the offending text with a fixed mask.
    ///
    /// The reason is replaced too, since element errors quote the element.
    pub(crate) fn masked(mut self, mask: &str) -> Self {
        self.value = mask.to_string();
        self.reason = format!("value is not a valid {}", self.kind);
        self
    }
}

/// Types that can be produced from an environment variable value.
pub trait FromEnvStr: Sized {
    /// Human readable kind used in error messages.
    const KIND: &'static str;

    fn from_env_str(raw: &str) -> Result<Self, ConversionError>;
}

impl FromEnvStr for String {
    const KIND: &'static str = "string";

    fn from_env_str(raw: &str) -> Result<Self, ConversionError> {
        Ok(raw.to_string())
    }
}

impl FromEnvStr for PathBuf {
    const KIND: &'static str = "path";

    fn from_env_str(raw: &str) -> Result<Self, ConversionError> {
        Ok(PathBuf::from(raw))
    }
}

impl FromEnvStr for bool {
    const KIND: &'static str = "bool";

    fn from_env_str(raw: &str) -> Result<Self, ConversionError> {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConversionError::new(
                raw,
                Self::KIND,
                "must be true, false, 1 or 0",
            )),
        }
    }
}

impl FromEnvStr for char {
    const KIND: &'static str = "char";

    fn from_env_str(raw: &str) -> Result<Self, ConversionError> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConversionError::new(
                raw,
                Self::KIND,
                "must be exactly one character",
            )),
        }
    }
}

macro_rules! impl_from_env_str_via_parse {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl FromEnvStr for $ty {
                const KIND: &'static str = $kind;

                fn from_env_str(raw: &str) -> Result<Self, ConversionError> {
                    raw.parse::<$ty>()
                        .map_err(|e| ConversionError::new(raw, Self::KIND, e))
                }
            }
        )*
    };
}

impl_from_env_str_via_parse!(
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
);

impl<T: FromEnvStr> FromEnvStr for Option<T> {
    const KIND: &'static str = T::KIND;

    fn from_env_str(raw: &str) -> Result<Self, ConversionError> {
        T::from_env_str(raw).map(Some)
    }
}

impl<T: FromEnvStr> FromEnvStr for Vec<T> {
    const KIND: &'static str = "list";

    fn from_env_str(raw: &str) -> Result<Self, ConversionError> {
        raw.split(',')
            .map(str::trim)
            .enumerate()
            .map(|(index, element)| {
                if element.is_empty() {
                    return Err(ConversionError::new(
                        raw,
                        Self::KIND,
                        format!("element {} is empty", index + 1),
                    ));
                }
                T::from_env_str(element).map_err(|e| {
                    ConversionError::new(raw, Self::KIND, format!("element {}", e))
                })
            })
            .collect()
    }
}
