//! API key material.
//!
//! Keys look like `gsk_<43 url-safe base64 chars>`. Only a SHA-256 digest of
//! the full key is ever stored; the prefix and the last four characters are
//! kept for display.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::AuthError;

/// Format/version tag carried by every key.
pub const KEY_PREFIX: &str = "gsk_";

/// Bytes of random key material.
const KEY_BYTES: usize = 32;

/// Number of trailing characters kept for display.
const SUFFIX_LEN: usize = 4;

/// Minimum encoded length after the prefix for [`looks_valid`].
const MIN_ENCODED_LEN: usize = 40;

/// A freshly generated key. `plaintext` must be shown to the caller once and
/// then dropped.
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    pub id: String,
    pub plaintext: String,
}

/// Generate a new API key and an opaque identifier for it.
pub fn generate_key() -> Result<GeneratedKey, AuthError> {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Internal(format!("entropy source: {e}")))?;

    Ok(GeneratedKey {
        id: Uuid::new_v4().to_string(),
        plaintext: format!("{KEY_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes)),
    })
}

/// SHA-256 hash a key for storage (url-safe base64, no padding).
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Split a key into its display parts `(prefix, suffix)`.
///
/// Returns empty strings when the key does not carry [`KEY_PREFIX`].
pub fn split_key(key: &str) -> (String, String) {
    if !key.starts_with(KEY_PREFIX) {
        return (String::new(), String::new());
    }

    let chars: Vec<char> = key.chars().collect();
    if chars.len() < KEY_PREFIX.len() + SUFFIX_LEN {
        return (KEY_PREFIX.to_string(), String::new());
    }

    let suffix = chars[chars.len() - SUFFIX_LEN..].iter().collect();
    (KEY_PREFIX.to_string(), suffix)
}

/// Cheap format pre-check. Not an authentication decision.
pub fn looks_valid(candidate: &str) -> bool {
    candidate
        .strip_prefix(KEY_PREFIX)
        .is_some_and(|rest| rest.len() >= MIN_ENCODED_LEN)
}

/// Display form of a stored key.
pub fn mask_key(prefix: &str, suffix: &str) -> String {
    format!("{prefix}****...****{suffix}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_key_has_prefix_and_expected_length() {
        let key = generate_key().unwrap();
        assert!(key.plaintext.starts_with(KEY_PREFIX));
        // 32 bytes -> 43 chars of unpadded base64
        assert_eq!(key.plaintext.len(), KEY_PREFIX.len() + 43);
        assert!(looks_valid(&key.plaintext));
        assert!(Uuid::parse_str(&key.id).is_ok());
    }

    #[test]
    fn generated_keys_are_distinct() {
        let keys: HashSet<String> = (0..32)
            .map(|_| generate_key().unwrap().plaintext)
            .collect();
        assert_eq!(keys.len(), 32);
    }

    #[test]
    fn generated_key_is_url_safe() {
        let key = generate_key().unwrap();
        assert!(
            key.plaintext
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        );
    }

    #[test]
    fn hash_is_deterministic() {
        let key = "gsk_0123456789012345678901234567890123456789";
        assert_eq!(hash_key(key), hash_key(key));
        assert_ne!(hash_key(key), key);
    }

    #[test]
    fn hash_differs_on_single_char() {
        let a = "gsk_0123456789012345678901234567890123456789";
        let b = "gsk_0123456789012345678901234567890123456788";
        assert_ne!(hash_key(a), hash_key(b));
    }

    #[test]
    fn hash_has_fixed_length() {
        // 32-byte digest -> 43 chars
        assert_eq!(hash_key("a").len(), 43);
        assert_eq!(hash_key(&"x".repeat(500)).len(), 43);
    }

    #[test]
    fn split_returns_prefix_and_last_four() {
        let key = format!("{KEY_PREFIX}{}", "a".repeat(36) + "WXYZ");
        assert_eq!(split_key(&key), ("gsk_".to_string(), "WXYZ".to_string()));
    }

    #[test]
    fn split_rejects_foreign_prefix() {
        assert_eq!(split_key("bad_x"), (String::new(), String::new()));
        assert_eq!(split_key(""), (String::new(), String::new()));
    }

    #[test]
    fn split_short_key_has_empty_suffix() {
        assert_eq!(split_key("gsk_ab"), ("gsk_".to_string(), String::new()));
    }

    #[test]
    fn looks_valid_requires_prefix_and_length() {
        assert!(looks_valid(&format!("gsk_{}", "a".repeat(40))));
        assert!(!looks_valid(&format!("gsk_{}", "a".repeat(39))));
        assert!(!looks_valid(&format!("xyz_{}", "a".repeat(43))));
        assert!(!looks_valid("eyJhbGciOiJIUzI1NiJ9.e30.sig"));
    }

    #[test]
    fn mask_hides_middle() {
        assert_eq!(mask_key("gsk_", "AbCd"), "gsk_****...****AbCd");
    }
}
