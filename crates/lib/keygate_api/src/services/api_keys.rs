//! API key service: create, list, rename and delete a user's keys.

use keygate_core::auth::api_keys::{generate_key, hash_key, split_key};
use keygate_core::models::auth::{NewApiKey, Principal};
use keygate_core::store::{CredentialStore, StoreError};
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::models::{
    ApiKeyInfo, CreateApiKeyResponse, DeleteApiKeyResponse, ListApiKeysResponse,
    UpdateApiKeyResponse,
};

/// Store failures other than not-found are logged and hidden from the caller.
fn store_error(op: &str, e: StoreError) -> AppError {
    match e {
        StoreError::NotFound => AppError::NotFound("API key not found".into()),
        e => {
            error!(error = %e, "failed to {} API key", op);
            AppError::Internal(format!("failed to {op} API key"))
        }
    }
}

/// Generate a key for `principal`. The plaintext is returned here and
/// nowhere else.
pub async fn create_api_key(
    store: &dyn CredentialStore,
    principal: &Principal,
    name: &str,
) -> AppResult<CreateApiKeyResponse> {
    if name.is_empty() {
        return Err(AppError::InvalidArgument("name is required".into()));
    }

    let key = generate_key().map_err(|e| {
        error!(error = %e, "failed to generate API key");
        AppError::Internal("failed to generate API key".into())
    })?;
    let (key_prefix, key_suffix) = split_key(&key.plaintext);

    let record = store
        .create_api_key(NewApiKey {
            id: key.id,
            user_id: principal.user_id,
            name: name.to_string(),
            key_hash: hash_key(&key.plaintext),
            key_prefix,
            key_suffix,
        })
        .await
        .map_err(|e| store_error("create", e))?;

    info!(user_id = principal.user_id, key_id = %record.id, "API key created");

    Ok(CreateApiKeyResponse {
        id: record.id,
        name: record.name,
        key: key.plaintext,
        created_at: record.created_at.to_rfc3339(),
    })
}

/// List the caller's keys in masked form.
pub async fn list_api_keys(
    store: &dyn CredentialStore,
    principal: &Principal,
) -> AppResult<ListApiKeysResponse> {
    let records = store
        .list_api_keys_by_user(principal.user_id)
        .await
        .map_err(|e| store_error("list", e))?;
    Ok(ListApiKeysResponse {
        api_keys: records.into_iter().map(ApiKeyInfo::from).collect(),
    })
}

/// Rename one of the caller's keys.
pub async fn update_api_key(
    store: &dyn CredentialStore,
    principal: &Principal,
    id: &str,
    name: &str,
) -> AppResult<UpdateApiKeyResponse> {
    if id.is_empty() {
        return Err(AppError::InvalidArgument("id is required".into()));
    }
    if name.is_empty() {
        return Err(AppError::InvalidArgument("name is required".into()));
    }

    let record = store
        .update_api_key_name(id, principal.user_id, name)
        .await
        .map_err(|e| store_error("update", e))?;
    Ok(UpdateApiKeyResponse {
        api_key: record.into(),
    })
}

/// Delete one of the caller's keys. Someone else's key is reported as not
/// found.
pub async fn delete_api_key(
    store: &dyn CredentialStore,
    principal: &Principal,
    id: &str,
) -> AppResult<DeleteApiKeyResponse> {
    if id.is_empty() {
        return Err(AppError::InvalidArgument("id is required".into()));
    }

    store
        .delete_api_key(id, principal.user_id)
        .await
        .map_err(|e| store_error("delete", e))?;

    info!(user_id = principal.user_id, key_id = %id, "API key deleted");
    Ok(DeleteApiKeyResponse { success: true })
}
