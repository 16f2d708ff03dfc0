//! Centralized constants for the layercfg workspace.
//!
//! This module contains names and defaults shared across the loader,
//! the binder and the built-in formats.

// =============================================================================
// Environment Files
// =============================================================================

/// Environment variable that disables `.env` discovery when set to `1` or `true`.
pub const DOTENV_DISABLED_VAR: &str = "DOTENV_DISABLED";

/// File name used when discovering an env file in the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

// =============================================================================
// Logging
// =============================================================================

/// Replacement text for secret values in logs and error messages.
pub const SECRET_MASK: &str = "******";

// =============================================================================
// Built-in Format Discriminators
// =============================================================================

/// Discriminator for JSON files.
pub const JSON_DISCRIMINATOR: &str = ".json";

/// Discriminators for YAML files.
pub const YAML_DISCRIMINATORS: &[&str] = &[".yaml", ".yml"];

/// Discriminator for TOML files.
pub const TOML_DISCRIMINATOR: &str = ".toml";
