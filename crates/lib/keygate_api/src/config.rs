//! API server configuration.

use chrono::Duration;
use keygate_core::auth::session::{
    DEFAULT_SESSION_TTL_SECS, MAX_SESSION_TTL_SECS, SecretError, SigningSecret,
};
use thiserror::Error;

/// Configuration errors, fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GOOGLE_CLIENT_ID is required")]
    MissingClientId,

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(
        "session TTL must be between 1 and {max} seconds, got {0}",
        max = MAX_SESSION_TTL_SECS
    )]
    InvalidSessionTtl(i64),
}

/// Configuration for the API server. Immutable once built.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:8080").
    pub bind_addr: String,
    /// Google OAuth client ID; the expected `aud` of identity tokens.
    pub identity_client_id: String,
    /// Session token signing secret.
    pub signing_secret: SigningSecret,
    /// Session token lifetime.
    pub session_ttl: Duration,
}

impl ApiConfig {
    /// Validate raw settings.
    ///
    /// | Setting            | Default                                   |
    /// |--------------------|-------------------------------------------|
    /// | identity client ID | required                                  |
    /// | signing secret     | random per process (logged as a warning)  |
    /// | session TTL        | 24 hours, at most 365 days                |
    pub fn new(
        bind_addr: impl Into<String>,
        identity_client_id: impl Into<String>,
        encoded_secret: Option<&str>,
        session_ttl_secs: Option<i64>,
    ) -> Result<Self, ConfigError> {
        let identity_client_id = identity_client_id.into();
        if identity_client_id.trim().is_empty() {
            return Err(ConfigError::MissingClientId);
        }

        let ttl_secs = session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS);
        let session_ttl = Some(ttl_secs)
            .filter(|secs| (1..=MAX_SESSION_TTL_SECS).contains(secs))
            .and_then(Duration::try_seconds)
            .ok_or(ConfigError::InvalidSessionTtl(ttl_secs))?;

        Ok(Self {
            bind_addr: bind_addr.into(),
            identity_client_id,
            signing_secret: SigningSecret::resolve(encoded_secret)?,
            session_ttl,
        })
    }
}
