//! The narrow persistence surface the gateway depends on.

use async_trait::async_trait;

use crate::models::autologin::AutologinToken;
use crate::models::token::StoredTokens;
use crate::models::user::{CreateUser, User};

/// Classified storage failure.
///
/// Callers branch on [`StoreError::DuplicateKey`]; everything else is opaque.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Duplicate {entity}")]
    DuplicateKey { entity: &'static str },

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Persistence of users, the latest token pair per user, and autologin tokens.
///
/// Implementations must make [`rotate_tokens`](Self::rotate_tokens) and
/// [`consume_autologin_token`](Self::consume_autologin_token) atomic
/// check-and-set operations.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Cheap liveness probe.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Fails with [`StoreError::DuplicateKey`] when the username exists.
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Insert or overwrite the pair for `tokens.username` (last write wins).
    async fn upsert_tokens(&self, tokens: &StoredTokens) -> Result<(), StoreError>;

    async fn find_tokens(&self, username: &str) -> Result<Option<StoredTokens>, StoreError>;

    /// Overwrite the pair only if the stored refresh digest equals
    /// `expected_refresh_hash`. Returns whether the swap happened.
    async fn rotate_tokens(
        &self,
        expected_refresh_hash: &str,
        tokens: &StoredTokens,
    ) -> Result<bool, StoreError>;

    async fn create_autologin_token(
        &self,
        username: &str,
        token: &str,
    ) -> Result<AutologinToken, StoreError>;

    /// Atomically mark `token` consumed. `None` if unknown or already consumed.
    async fn consume_autologin_token(
        &self,
        token: &str,
    ) -> Result<Option<AutologinToken>, StoreError>;
}
