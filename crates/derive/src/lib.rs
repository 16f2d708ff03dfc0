//! Proc macro generating environment variable bindings for layercfg configuration structs.
//!
//! `#[derive(EnvBind)]` implements `layercfg::EnvBind`:
//! - a static descriptor for every field, in declaration order
//! - a `bind_env` walking those fields depth-first
//!
//! # Field Attributes
//! - `#[env(var = "NAME")]` - bind the field from environment variable `NAME`
//! - `#[env(secret)]` - mask the value in logs and errors (requires `var`)
//! - `#[env(nested)]` - recurse into the field as a nested configuration
//! - `#[env(skip)]` - never touch the field
//!
//! # Type Inference
//!
//! Fields without an attribute are classified by type:
//! - **Leaf types** (primitives, `String`, `PathBuf`, `Option`, `Vec`, maps, sets,
//!   `Duration`): skipped, since they carry no variable name
//! - **Anything else**: assumed to be a nested configuration implementing `EnvBind`
//!
//! Use `#[env(skip)]` for custom value types (e.g. enums) that are not nested configs.

mod env_bind;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derive macro implementing `layercfg::EnvBind`.
///
/// ```ignore
/// #[derive(EnvBind)]
/// pub struct Configuration {
///     #[env(var = "APP_PORT")]
///     pub port: u16,                     // Leaf: APP_PORT
///     pub mysql: MysqlConfiguration,     // Nested: recursed into
///     #[env(skip)]
///     pub mode: Mode,                    // Custom value type, left alone
/// }
/// ```
#[proc_macro_derive(EnvBind, attributes(env))]
pub fn derive_env_bind(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    env_bind::generate_impl(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
