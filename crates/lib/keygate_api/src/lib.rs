//! # keygate_api
//!
//! Connect-style RPC API for Keygate: login with a Google ID token, session
//! gating and API key management.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use keygate_core::auth::identity::{IdentityOracle, IdentityVerifier};
use keygate_core::auth::interceptor::AccessInterceptor;
use keygate_core::auth::session::SessionTokenCodec;
use keygate_core::store::CredentialStore;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::handlers::{api_keys, auth, greeter};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// User and API key storage.
    pub store: Arc<dyn CredentialStore>,
    /// Google ID token verification.
    pub identity: Arc<IdentityVerifier>,
    /// Session token issuance/verification.
    pub sessions: Arc<SessionTokenCodec>,
    /// Per-call access decision.
    pub interceptor: Arc<AccessInterceptor>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Wire the codecs from `config` around the given collaborators.
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn CredentialStore>,
        oracle: Arc<dyn IdentityOracle>,
    ) -> Self {
        let sessions = Arc::new(SessionTokenCodec::new(
            &config.signing_secret,
            config.session_ttl,
        ));
        let interceptor = Arc::new(AccessInterceptor::new(
            sessions.clone(),
            routes::PUBLIC_METHODS,
        ));
        Self {
            store,
            identity: Arc::new(IdentityVerifier::new(oracle)),
            sessions,
            interceptor,
            config,
        }
    }
}

/// Builds the Axum router with all RPC methods and shared state.
///
/// Every route sits behind the same auth middleware; public methods are
/// exempted by name inside the interceptor, not by routing. Unknown methods
/// skip the middleware and get `not_found`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(routes::AUTH_LOGIN, post(auth::login_handler))
        .route(routes::AUTH_GET_CURRENT_USER, post(auth::get_current_user_handler))
        .route(routes::AUTH_LOGOUT, post(auth::logout_handler))
        .route(routes::API_KEY_CREATE, post(api_keys::create_api_key_handler))
        .route(routes::API_KEY_LIST, post(api_keys::list_api_keys_handler))
        .route(routes::API_KEY_UPDATE, post(api_keys::update_api_key_handler))
        .route(routes::API_KEY_DELETE, post(api_keys::delete_api_key_handler))
        .route(routes::GREETER_SAY_HELLO, post(greeter::say_hello_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ))
        .fallback(unknown_method)
        .layer(cors)
        .with_state(state)
}

async fn unknown_method(uri: axum::http::Uri) -> AppError {
    AppError::NotFound(format!("unknown method {}", uri.path()))
}
