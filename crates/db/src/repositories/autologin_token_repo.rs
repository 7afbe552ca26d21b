//! Repository for the `autologin_tokens` table.

use sqlx::PgPool;

use crate::models::autologin::AutologinToken;

const COLUMNS: &str = "token, username, created_at, consumed_at";

/// Creates and consumes single-use autologin tokens.
pub struct AutologinTokenRepo;

impl AutologinTokenRepo {
    pub async fn create(
        pool: &PgPool,
        username: &str,
        token: &str,
    ) -> Result<AutologinToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO autologin_tokens (token, username)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AutologinToken>(&query)
            .bind(token)
            .bind(username)
            .fetch_one(pool)
            .await
    }

    /// Mark an unconsumed token as consumed and return it.
    ///
    /// The check and the write are one statement, so of any number of
    /// concurrent callers exactly one gets `Some`.
    pub async fn consume(pool: &PgPool, token: &str) -> Result<Option<AutologinToken>, sqlx::Error> {
        let query = format!(
            "UPDATE autologin_tokens SET consumed_at = NOW()
             WHERE token = $1 AND consumed_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AutologinToken>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }
}
