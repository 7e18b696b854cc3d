//! Authentication service: Google login, current user and logout.

use keygate_core::auth::identity::IdentityVerifier;
use keygate_core::auth::session::SessionTokenCodec;
use keygate_core::models::auth::{IdentityClaims, NewUser, Principal, User};
use keygate_core::store::{CredentialStore, StoreError};
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{GetCurrentUserResponse, LoginResponse, LogoutResponse};

/// Exchange a Google ID token for a session token.
///
/// Creates the user on first login; afterwards only the display name is
/// refreshed.
pub async fn login(
    store: &dyn CredentialStore,
    identity: &IdentityVerifier,
    sessions: &SessionTokenCodec,
    audience: &str,
    identity_token: &str,
) -> AppResult<LoginResponse> {
    let claims = identity
        .validate(identity_token, audience)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to validate Google ID token");
            AppError::from(e)
        })?;

    if !claims.email_verified {
        warn!(email = %claims.email, "unverified email attempted login");
        return Err(AppError::PermissionDenied("unauthorized".into()));
    }

    let user = match store.find_user_by_subject_id(&claims.subject_id).await {
        Ok(user) => refresh_profile(store, user, &claims).await?,
        Err(StoreError::NotFound) => create_user(store, &claims).await?,
        Err(e) => {
            error!(error = %e, "failed to find user");
            return Err(AppError::from(e));
        }
    };

    let jwt = sessions.issue(user.id, &user.email).map_err(|e| {
        error!(error = %e, "failed to generate JWT");
        AppError::from(e)
    })?;

    info!(user_id = user.id, email = %user.email, "user logged in");

    Ok(LoginResponse {
        jwt,
        user: user.into(),
    })
}

/// Create the user, tolerating a concurrent login that created it first.
async fn create_user(store: &dyn CredentialStore, claims: &IdentityClaims) -> AppResult<User> {
    match store.create_user(NewUser::from(claims)).await {
        Ok(user) => {
            info!(user_id = user.id, email = %user.email, "new user created");
            Ok(user)
        }
        Err(StoreError::Conflict(_)) => store
            .find_user_by_subject_id(&claims.subject_id)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to re-fetch user after conflict");
                AppError::Internal(e.to_string())
            }),
        Err(e) => {
            error!(error = %e, "failed to create user");
            Err(AppError::Internal(e.to_string()))
        }
    }
}

/// Refresh the display name. A failed update is logged, not fatal.
async fn refresh_profile(
    store: &dyn CredentialStore,
    user: User,
    claims: &IdentityClaims,
) -> AppResult<User> {
    if let Err(e) = store
        .update_user_profile(user.id, &claims.display_name)
        .await
    {
        warn!(user_id = user.id, error = %e, "failed to update user profile");
    }

    store.get_user_by_id(user.id).await.map_err(|e| {
        error!(error = %e, "failed to get user after update");
        AppError::Internal(e.to_string())
    })
}

/// Resolve the authenticated principal to its user record.
pub async fn current_user(
    store: &dyn CredentialStore,
    principal: &Principal,
) -> AppResult<GetCurrentUserResponse> {
    let user = store
        .get_user_by_id(principal.user_id)
        .await
        .map_err(|e| {
            if !matches!(e, StoreError::NotFound) {
                error!(user_id = principal.user_id, error = %e, "failed to get user");
            }
            AppError::from(e)
        })?;
    Ok(GetCurrentUserResponse { user: user.into() })
}

/// Logout is client-side: the session token is simply discarded.
pub fn logout(principal: &Principal) -> LogoutResponse {
    info!(user_id = principal.user_id, "user logged out");
    LogoutResponse { success: true }
}
