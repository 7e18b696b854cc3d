//! # keygate_core
//!
//! Core credential logic for Keygate: identity-token verification, session
//! tokens, API key material and the credential store abstraction.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
