//! Per-call access decision.
//!
//! [`AccessInterceptor`] is evaluated fresh for every inbound call: public
//! methods pass untouched, everything else must present
//! `Authorization: Bearer <session token>`.

use std::collections::HashSet;
use std::sync::Arc;

use http::HeaderMap;
use http::header::AUTHORIZATION;

use super::AuthError;
use super::api_keys;
use super::session::SessionTokenCodec;
use crate::models::auth::Principal;

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of a successful access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Method is exempt; no principal is bound.
    Public,
    /// Session token verified for this principal.
    Authenticated(Principal),
}

/// Decides whether a call may proceed and who is calling.
#[derive(Clone)]
pub struct AccessInterceptor {
    sessions: Arc<SessionTokenCodec>,
    public_methods: HashSet<String>,
}

impl AccessInterceptor {
    pub fn new<I, S>(sessions: Arc<SessionTokenCodec>, public_methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sessions,
            public_methods: public_methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_public(&self, method: &str) -> bool {
        self.public_methods.contains(method)
    }

    /// Classify `method`, then extract and verify the bearer session token.
    pub fn check(&self, method: &str, headers: &HeaderMap) -> Result<Access, AuthError> {
        if self.is_public(method) {
            return Ok(Access::Public);
        }

        let header = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidScheme)?;
        if header.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::InvalidScheme)?;

        // API keys are issued but not accepted as request credentials.
        if api_keys::looks_valid(token) {
            return Err(AuthError::TokenInvalid(
                "api key authentication is not supported".into(),
            ));
        }

        let claims = self.sessions.verify(token)?;
        Ok(Access::Authenticated(claims.into()))
    }
}
