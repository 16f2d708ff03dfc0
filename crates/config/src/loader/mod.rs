//! Configuration loader for files, env files and environment variables.
//!
//! Responsibilities:
//! - Provide the builder-pattern `ConfigLoader` driving file decoding and
//!   environment binding.
//! - Import `.env`-style files before binding.
//!
//! Does NOT handle:
//! - Individual file formats (see `format`).
//! - Field conversion (see `convert.rs`).
//!
//! Invariants / Assumptions:
//! - Environment variables take precedence over file values.
//! - Env file values never override variables present in the environment source.
//! - The `DOTENV_DISABLED` variable is checked before `.env` discovery.

mod builder;
mod dotenv;

#[cfg(test)]
mod tests;

pub use builder::ConfigLoader;
pub use dotenv::EnvFiles;
