//! Durable storage for users and API keys.
//!
//! Every lookup either returns a record or [`StoreError::NotFound`]. API key
//! mutations are scoped by `(id, user_id)`, so a key owned by someone else is
//! indistinguishable from a missing one.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{ApiKeyRecord, NewApiKey, NewUser, User};

pub use memory::MemoryCredentialStore;
pub use pg::PgCredentialStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Persistence interface consumed by the login and API key services.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_subject_id(&self, subject_id: &str) -> Result<User, StoreError>;

    /// Fails with [`StoreError::Conflict`] if the subject ID is already taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update_user_profile(&self, id: i64, name: &str) -> Result<(), StoreError>;

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError>;

    async fn create_api_key(&self, key: NewApiKey) -> Result<ApiKeyRecord, StoreError>;

    /// Newest first.
    async fn list_api_keys_by_user(&self, user_id: i64) -> Result<Vec<ApiKeyRecord>, StoreError>;

    async fn delete_api_key(&self, id: &str, user_id: i64) -> Result<(), StoreError>;

    async fn update_api_key_name(
        &self,
        id: &str,
        user_id: i64,
        name: &str,
    ) -> Result<ApiKeyRecord, StoreError>;
}
