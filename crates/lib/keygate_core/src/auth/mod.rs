//! Authentication logic.
//!
//! Provides identity-token verification, session-token issuance, API key
//! material and the per-call access decision, shared by `keygate_api` and the
//! server binary.

pub mod api_keys;
pub mod identity;
pub mod interceptor;
pub mod session;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,

    /// Authorization header present but not a `Bearer` credential.
    #[error("invalid token")]
    InvalidScheme,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("token expired")]
    TokenExpired,

    #[error("invalid identity token: {0}")]
    IdentityTokenInvalid(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
