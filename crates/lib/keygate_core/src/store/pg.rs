//! PostgreSQL credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{CredentialStore, StoreError};
use crate::models::auth::{ApiKeyRecord, NewApiKey, NewUser, User};

type UserRow = (i64, String, String, String);

type ApiKeyRow = (
    String,
    i64,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

const API_KEY_COLUMNS: &str =
    "id, user_id, name, key_hash, key_prefix, key_suffix, created_at, last_used_at";

fn user_from_row((id, email, google_id, name): UserRow) -> User {
    User {
        id,
        email,
        google_id,
        name,
    }
}

fn api_key_from_row(
    (id, user_id, name, key_hash, key_prefix, key_suffix, created_at, last_used_at): ApiKeyRow,
) -> ApiKeyRecord {
    ApiKeyRecord {
        id,
        user_id,
        name,
        key_hash,
        key_prefix,
        key_suffix,
        created_at,
        last_used_at,
    }
}

/// Map unique-constraint violations to [`StoreError::Conflict`].
fn conflict_or_db(e: sqlx::Error) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::Conflict(db.message().to_string()),
        _ => StoreError::Db(e),
    }
}

/// Owner-scoped writes that touch no row did not find a match.
fn require_affected(rows_affected: u64) -> Result<(), StoreError> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

/// Credential store backed by the `users` and `api_keys` tables.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_subject_id(&self, subject_id: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, google_id, name FROM users WHERE google_id = $1",
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(user_from_row).ok_or(StoreError::NotFound)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, google_id, name) VALUES ($1, $2, $3) \
             RETURNING id, email, google_id, name",
        )
        .bind(&user.email)
        .bind(&user.google_id)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or_db)?;
        Ok(user_from_row(row))
    }

    async fn update_user_profile(&self, id: i64, name: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET name = $1, updated_at = now() WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_affected(result.rows_affected())
    }

    async fn get_user_by_id(&self, id: i64) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, google_id, name FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(user_from_row).ok_or(StoreError::NotFound)
    }

    async fn create_api_key(&self, key: NewApiKey) -> Result<ApiKeyRecord, StoreError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "INSERT INTO api_keys (id, user_id, name, key_hash, key_prefix, key_suffix) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {API_KEY_COLUMNS}"
        ))
        .bind(&key.id)
        .bind(key.user_id)
        .bind(&key.name)
        .bind(&key.key_hash)
        .bind(&key.key_prefix)
        .bind(&key.key_suffix)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or_db)?;
        Ok(api_key_from_row(row))
    }

    async fn list_api_keys_by_user(&self, user_id: i64) -> Result<Vec<ApiKeyRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys \
             WHERE user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(api_key_from_row).collect())
    }

    async fn delete_api_key(&self, id: &str, user_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        require_affected(result.rows_affected())
    }

    async fn update_api_key_name(
        &self,
        id: &str,
        user_id: i64,
        name: &str,
    ) -> Result<ApiKeyRecord, StoreError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(&format!(
            "UPDATE api_keys SET name = $1 \
             WHERE id = $2 AND user_id = $3 \
             RETURNING {API_KEY_COLUMNS}"
        ))
        .bind(name)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(api_key_from_row).ok_or(StoreError::NotFound)
    }
}
