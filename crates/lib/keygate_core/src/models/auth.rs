//! Authentication domain models.
//!
//! These are internal domain models, distinct from the RPC request/response
//! types in `keygate_api` (which use camelCase on the wire).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::api_keys::mask_key;

/// Normalised claims extracted from a verified identity-provider token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub email: String,
    /// Provider-scoped stable identifier (`sub`).
    pub subject_id: String,
    pub display_name: String,
    pub picture_url: String,
    pub email_verified: bool,
}

/// JWT claims embedded in session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID of the principal.
    pub user_id: i64,
    /// User email.
    pub email: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Not before (unix timestamp).
    pub nbf: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// The authenticated caller bound to a request after session verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
}

impl From<SessionClaims> for Principal {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

/// Domain user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Identity-provider subject ID.
    pub google_id: String,
    pub name: String,
}

/// Fields required to create a user on first login.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub google_id: String,
    pub name: String,
}

impl From<&IdentityClaims> for NewUser {
    fn from(claims: &IdentityClaims) -> Self {
        Self {
            email: claims.email.clone(),
            google_id: claims.subject_id.clone(),
            name: claims.display_name.clone(),
        }
    }
}

/// API key record stored in the database. Never carries the plaintext key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRecord {
    pub id: String,
    pub user_id: i64,
    pub name: String,
    pub key_hash: String,
    pub key_prefix: String,
    pub key_suffix: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ApiKeyRecord {
    /// Display-safe form of the key, e.g. `gsk_****...****AbCd`.
    pub fn masked(&self) -> String {
        mask_key(&self.key_prefix, &self.key_suffix)
    }
}

/// Fields persisted when an API key is created.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub id: String,
    pub user_id: i64,
    pub name: String,
    pub key_hash: String,
    pub key_prefix: String,
    pub key_suffix: String,
}
