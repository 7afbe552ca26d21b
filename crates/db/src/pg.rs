//! Postgres-backed [`CredentialStore`].

use async_trait::async_trait;

use crate::models::autologin::AutologinToken;
use crate::models::token::StoredTokens;
use crate::models::user::{CreateUser, User};
use crate::repositories::{AutologinTokenRepo, TokenRepo, UserRepo};
use crate::store::{CredentialStore, StoreError};
use crate::DbPool;

/// Delegates to the repositories and classifies driver errors.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Map a sqlx error to a [`StoreError`], using the driver's unique-violation
/// classification rather than its message text.
pub fn classify(entity: &'static str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            tracing::debug!(entity, constraint = ?db_err.constraint(), "Unique violation");
            return StoreError::DuplicateKey { entity };
        }
    }
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(|e| classify("health check", e))
    }

    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        UserRepo::create(&self.pool, input)
            .await
            .map_err(|e| classify("user", e))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        UserRepo::find_by_username(&self.pool, username)
            .await
            .map_err(|e| classify("user", e))
    }

    async fn upsert_tokens(&self, tokens: &StoredTokens) -> Result<(), StoreError> {
        TokenRepo::upsert(&self.pool, tokens)
            .await
            .map_err(|e| classify("token pair", e))
    }

    async fn find_tokens(&self, username: &str) -> Result<Option<StoredTokens>, StoreError> {
        TokenRepo::find_by_username(&self.pool, username)
            .await
            .map_err(|e| classify("token pair", e))
    }

    async fn rotate_tokens(
        &self,
        expected_refresh_hash: &str,
        tokens: &StoredTokens,
    ) -> Result<bool, StoreError> {
        TokenRepo::rotate(&self.pool, expected_refresh_hash, tokens)
            .await
            .map_err(|e| classify("token pair", e))
    }

    async fn create_autologin_token(
        &self,
        username: &str,
        token: &str,
    ) -> Result<AutologinToken, StoreError> {
        AutologinTokenRepo::create(&self.pool, username, token)
            .await
            .map_err(|e| classify("autologin token", e))
    }

    async fn consume_autologin_token(
        &self,
        token: &str,
    ) -> Result<Option<AutologinToken>, StoreError> {
        AutologinTokenRepo::consume(&self.pool, token)
            .await
            .map_err(|e| classify("autologin token", e))
    }
}
