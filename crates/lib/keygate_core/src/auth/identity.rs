//! Google ID token verification.
//!
//! Signature and expiry checks are delegated to an [`IdentityOracle`]; the
//! verifier then re-checks issuer and audience itself and normalises the
//! claim set into [`IdentityClaims`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::AuthError;
use crate::models::auth::IdentityClaims;

/// Issuer strings Google uses for ID tokens.
pub const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

/// Google's token introspection endpoint.
pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// HTTP timeout for oracle calls.
const ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw claim set returned by an oracle.
pub type ClaimMap = Map<String, Value>;

/// Trusted verifier of identity-provider tokens.
///
/// Implementations must check the signature, expiry and audience, and fail
/// closed on anything they cannot establish.
#[async_trait]
pub trait IdentityOracle: Send + Sync {
    async fn verify(&self, raw_token: &str, audience: &str) -> Result<ClaimMap, AuthError>;
}

/// Oracle backed by Google's `tokeninfo` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTokenInfoOracle {
    client: Client,
    endpoint: String,
}

impl GoogleTokenInfoOracle {
    pub fn new() -> Self {
        Self::with_endpoint(GOOGLE_TOKENINFO_URL)
    }

    /// Point the oracle at a different tokeninfo-compatible endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(ORACLE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl Default for GoogleTokenInfoOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityOracle for GoogleTokenInfoOracle {
    async fn verify(&self, raw_token: &str, audience: &str) -> Result<ClaimMap, AuthError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", raw_token)])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, endpoint = %self.endpoint, "tokeninfo request failed");
                AuthError::IdentityTokenInvalid(format!("identity provider unavailable: {e}"))
            })?;

        let status = resp.status();
        if !status.is_success() {
            debug!(http_status = %status, "tokeninfo rejected token");
            return Err(AuthError::IdentityTokenInvalid(format!(
                "identity provider rejected token ({status})"
            )));
        }

        let claims = resp
            .json::<ClaimMap>()
            .await
            .map_err(|e| AuthError::IdentityTokenInvalid(format!("malformed tokeninfo response: {e}")))?;

        // tokeninfo checks signature and expiry but not the audience.
        if claim_str(&claims, "aud") != Some(audience) {
            return Err(AuthError::IdentityTokenInvalid("audience mismatch".into()));
        }

        Ok(claims)
    }
}

/// Validates identity tokens and extracts normalised claims.
#[derive(Clone)]
pub struct IdentityVerifier {
    oracle: Arc<dyn IdentityOracle>,
}

impl IdentityVerifier {
    pub fn new(oracle: Arc<dyn IdentityOracle>) -> Self {
        Self { oracle }
    }

    /// Validate `raw_token` for `expected_audience`.
    ///
    /// `email_verified` is returned as-is; rejecting unverified emails is
    /// the caller's policy.
    pub async fn validate(
        &self,
        raw_token: &str,
        expected_audience: &str,
    ) -> Result<IdentityClaims, AuthError> {
        if raw_token.is_empty() {
            return Err(AuthError::IdentityTokenInvalid("empty token".into()));
        }

        let claims = self.oracle.verify(raw_token, expected_audience).await?;

        let issuer = claim_str(&claims, "iss").unwrap_or_default();
        if !GOOGLE_ISSUERS.contains(&issuer) {
            return Err(AuthError::IdentityTokenInvalid(format!(
                "invalid issuer: {issuer}"
            )));
        }

        let audience = claim_str(&claims, "aud").unwrap_or_default();
        if audience != expected_audience {
            return Err(AuthError::IdentityTokenInvalid(format!(
                "invalid audience: expected {expected_audience}, got {audience}"
            )));
        }

        let email = claim_str(&claims, "email").unwrap_or_default();
        let subject_id = claim_str(&claims, "sub").unwrap_or_default();
        if email.is_empty() || subject_id.is_empty() {
            return Err(AuthError::IdentityTokenInvalid(
                "token missing email or subject".into(),
            ));
        }

        Ok(IdentityClaims {
            email: email.to_string(),
            subject_id: subject_id.to_string(),
            display_name: claim_str(&claims, "name").unwrap_or_default().to_string(),
            picture_url: claim_str(&claims, "picture").unwrap_or_default().to_string(),
            email_verified: claim_bool(&claims, "email_verified"),
        })
    }
}

fn claim_str<'a>(claims: &'a ClaimMap, key: &str) -> Option<&'a str> {
    claims.get(key).and_then(Value::as_str)
}

/// tokeninfo encodes booleans as strings.
fn claim_bool(claims: &ClaimMap, key: &str) -> bool {
    match claims.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}
