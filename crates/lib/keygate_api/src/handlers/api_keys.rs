//! API key management request handlers.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::RpcJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    CreateApiKeyRequest, CreateApiKeyResponse, DeleteApiKeyRequest, DeleteApiKeyResponse,
    ListApiKeysResponse, UpdateApiKeyRequest, UpdateApiKeyResponse,
};
use crate::services::api_keys;

/// `APIKeyService/CreateAPIKey`: the response carries the only copy of the
/// plaintext key.
pub async fn create_api_key_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    RpcJson(body): RpcJson<CreateApiKeyRequest>,
) -> AppResult<Json<CreateApiKeyResponse>> {
    let resp = api_keys::create_api_key(state.store.as_ref(), &user.0, &body.name).await?;
    Ok(Json(resp))
}

/// `APIKeyService/ListAPIKeys`
pub async fn list_api_keys_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ListApiKeysResponse>> {
    let resp = api_keys::list_api_keys(state.store.as_ref(), &user.0).await?;
    Ok(Json(resp))
}

/// `APIKeyService/UpdateAPIKey`: rename only.
pub async fn update_api_key_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    RpcJson(body): RpcJson<UpdateApiKeyRequest>,
) -> AppResult<Json<UpdateApiKeyResponse>> {
    let resp =
        api_keys::update_api_key(state.store.as_ref(), &user.0, &body.id, &body.name).await?;
    Ok(Json(resp))
}

/// `APIKeyService/DeleteAPIKey`
pub async fn delete_api_key_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    RpcJson(body): RpcJson<DeleteApiKeyRequest>,
) -> AppResult<Json<DeleteApiKeyResponse>> {
    let resp = api_keys::delete_api_key(state.store.as_ref(), &user.0, &body.id).await?;
    Ok(Json(resp))
}
