//! Authentication middleware: runs the access interceptor on every call and
//! binds the verified principal to the request.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use keygate_core::auth::interceptor::Access;
use keygate_core::models::auth::Principal;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Verified caller. Handlers that take this extractor cannot run for an
/// unauthenticated call.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

impl AuthenticatedUser {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("user not authenticated".into()))
    }
}

/// Axum middleware: classifies the call by path, verifies
/// `Authorization: Bearer <token>` for non-public methods, and injects
/// `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let access = state
        .interceptor
        .check(request.uri().path(), request.headers())
        .map_err(|e| {
            debug!(method = %request.uri().path(), error = %e, "call rejected");
            AppError::from(e)
        })?;

    if let Access::Authenticated(principal) = access {
        request.extensions_mut().insert(AuthenticatedUser(principal));
    }

    Ok(next.run(request).await)
}
