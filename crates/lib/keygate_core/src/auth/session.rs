//! Session token issuance and verification.
//!
//! Session tokens are HMAC-signed JWTs carrying the user ID and email. They
//! are stateless: nothing is stored server-side, so validity is decided by
//! the signature and the `[nbf, exp)` window alone.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::TryRngCore;
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{debug, warn};

use super::AuthError;
use crate::models::auth::SessionClaims;

/// Default session lifetime: 24 hours.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Longest accepted session lifetime: 365 days.
pub const MAX_SESSION_TTL_SECS: i64 = 365 * DEFAULT_SESSION_TTL_SECS;

/// Length of a generated signing secret.
const SECRET_BYTES: usize = 32;

/// Errors resolving the signing secret at startup.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to decode signing secret: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("signing secret is empty")]
    Empty,

    #[error("failed to generate signing secret: {0}")]
    Entropy(String),
}

/// Symmetric key used to sign session tokens.
///
/// Established once at startup and read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, SecretError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(SecretError::Empty);
        }
        Ok(Self(bytes))
    }

    /// Decode a standard-base64 secret.
    pub fn from_base64(encoded: &str) -> Result<Self, SecretError> {
        Self::from_bytes(STANDARD.decode(encoded.trim())?)
    }

    /// Generate a random secret from the OS entropy source.
    pub fn generate() -> Result<Self, SecretError> {
        let mut bytes = vec![0u8; SECRET_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SecretError::Entropy(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Use the configured secret if there is one, otherwise a random
    /// per-process secret. Tokens signed with a random secret do not survive
    /// a restart.
    pub fn resolve(encoded: Option<&str>) -> Result<Self, SecretError> {
        match encoded.filter(|s| !s.trim().is_empty()) {
            Some(encoded) => Self::from_base64(encoded),
            None => {
                let secret = Self::generate()?;
                warn!("using randomly generated JWT secret - tokens will not persist across restarts");
                Ok(secret)
            }
        }
    }

    /// Standard-base64 form, suitable for `JWT_SECRET`.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Issues and verifies session tokens with a fixed secret and lifetime.
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionTokenCodec {
    pub fn new(secret: &SigningSecret, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Configured session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a session token with the configured lifetime.
    pub fn issue(&self, user_id: i64, email: &str) -> Result<String, AuthError> {
        self.issue_with_ttl(user_id, email, self.ttl)
    }

    /// Issue a signed session token (HS256) valid from now for `ttl`.
    pub fn issue_with_ttl(
        &self,
        user_id: i64,
        email: &str,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Internal(format!("session TTL {ttl} overflows")))?;
        let claims = SessionClaims {
            user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify a session token, returning the claims on success.
    ///
    /// Only HMAC algorithms are accepted; anything else in the header is
    /// rejected before the signature is checked.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation()).map_err(
            |e| {
                debug!(error = %e, "session token rejected");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::TokenInvalid(e.to_string()),
                }
            },
        )?;

        // The validator accepts exp == now; the window is half-open.
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(data.claims)
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_required_spec_claims(&["exp", "nbf"]);
    validation
}
