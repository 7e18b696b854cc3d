//! In-process credential store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CredentialStore, StoreError};
use crate::models::auth::{ApiKeyRecord, NewApiKey, NewUser, User};

#[derive(Default)]
struct Tables {
    next_user_id: i64,
    users: HashMap<i64, User>,
    api_keys: HashMap<String, ApiKeyRecord>,
}

/// Credential store held in memory. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_subject_id(&self, subject_id: &str) -> Result<User, StoreError> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.google_id == subject_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.google_id == user.google_id) {
            return Err(StoreError::Conflict(format!(
                "user with subject '{}' already exists",
                user.google_id
            )));
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            email: user.email,
            google_id: user.google_id,
            name: user.name,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_profile(&self, id: i64, name: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.name = name.to_string();
        Ok(())
    }

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError> {
        let tables = self.tables.read().await;
        tables.users.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn create_api_key(&self, key: NewApiKey) -> Result<ApiKeyRecord, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&key.user_id) {
            return Err(StoreError::Internal(format!(
                "api key owner {} does not exist",
                key.user_id
            )));
        }
        if tables.api_keys.contains_key(&key.id)
            || tables.api_keys.values().any(|k| k.key_hash == key.key_hash)
        {
            return Err(StoreError::Conflict("api key already exists".into()));
        }

        let record = ApiKeyRecord {
            id: key.id,
            user_id: key.user_id,
            name: key.name,
            key_hash: key.key_hash,
            key_prefix: key.key_prefix,
            key_suffix: key.key_suffix,
            created_at: Utc::now(),
            last_used_at: None,
        };
        tables.api_keys.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn list_api_keys_by_user(&self, user_id: i64) -> Result<Vec<ApiKeyRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut keys: Vec<ApiKeyRecord> = tables
            .api_keys
            .values()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(keys)
    }

    async fn delete_api_key(&self, id: &str, user_id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        match tables.api_keys.get(id) {
            Some(k) if k.user_id == user_id => {
                tables.api_keys.remove(id);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn update_api_key_name(
        &self,
        id: &str,
        user_id: i64,
        name: &str,
    ) -> Result<ApiKeyRecord, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.api_keys.get_mut(id) {
            Some(k) if k.user_id == user_id => {
                k.name = name.to_string();
                Ok(k.clone())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}
