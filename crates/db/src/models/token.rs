//! Issued token pairs.

use serde::Serialize;
use sqlx::FromRow;
use uacl_core::types::Timestamp;

/// An access/refresh pair as handed to the client.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub username: String,
    pub token: String,
    pub refresh_token: String,
    pub updated_at: Timestamp,
}

/// The persisted form of the latest [`TokenPair`] for a user.
///
/// Only SHA-256 hex digests are stored, so a leaked table cannot be replayed.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StoredTokens {
    pub username: String,
    pub token_hash: String,
    pub refresh_token_hash: String,
    pub updated_at: Timestamp,
}
