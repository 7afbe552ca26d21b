//! Repository for the `tokens` table (latest token pair per user).

use sqlx::PgPool;

use crate::models::token::StoredTokens;

const COLUMNS: &str = "username, token_hash, refresh_token_hash, updated_at";

/// Persists the single active token pair of each user.
pub struct TokenRepo;

impl TokenRepo {
    /// Insert or overwrite the pair for `tokens.username` in one statement.
    pub async fn upsert(pool: &PgPool, tokens: &StoredTokens) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO tokens (username, token_hash, refresh_token_hash, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (username) DO UPDATE SET
                token_hash = EXCLUDED.token_hash,
                refresh_token_hash = EXCLUDED.refresh_token_hash,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(&tokens.username)
        .bind(&tokens.token_hash)
        .bind(&tokens.refresh_token_hash)
        .bind(tokens.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<StoredTokens>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tokens WHERE username = $1");
        sqlx::query_as::<_, StoredTokens>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Replace the pair only if the stored refresh digest is still
    /// `expected_refresh_hash`.
    ///
    /// Returns `true` if this call performed the rotation.
    pub async fn rotate(
        pool: &PgPool,
        expected_refresh_hash: &str,
        tokens: &StoredTokens,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tokens SET
                token_hash = $3,
                refresh_token_hash = $4,
                updated_at = $5
             WHERE username = $1 AND refresh_token_hash = $2",
        )
        .bind(&tokens.username)
        .bind(expected_refresh_hash)
        .bind(&tokens.token_hash)
        .bind(&tokens.refresh_token_hash)
        .bind(tokens.updated_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
