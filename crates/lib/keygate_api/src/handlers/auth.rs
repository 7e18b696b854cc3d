//! Authentication request handlers.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::RpcJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{GetCurrentUserResponse, LoginRequest, LoginResponse, LogoutResponse};
use crate::services::auth;

/// `AuthService/Login`: exchange a Google ID token for a session token.
pub async fn login_handler(
    State(state): State<AppState>,
    RpcJson(body): RpcJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let resp = auth::login(
        state.store.as_ref(),
        &state.identity,
        &state.sessions,
        &state.config.identity_client_id,
        &body.google_id_token,
    )
    .await?;
    Ok(Json(resp))
}

/// `AuthService/GetCurrentUser`
pub async fn get_current_user_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<GetCurrentUserResponse>> {
    let resp = auth::current_user(state.store.as_ref(), &user.0).await?;
    Ok(Json(resp))
}

/// `AuthService/Logout`: nothing to revoke; the client drops its token.
pub async fn logout_handler(user: AuthenticatedUser) -> Json<LogoutResponse> {
    Json(auth::logout(&user.0))
}
