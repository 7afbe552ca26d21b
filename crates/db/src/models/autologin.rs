//! Single-use autologin token rows.

use sqlx::FromRow;
use uacl_core::types::Timestamp;

/// A row from the `autologin_tokens` table.
///
/// `consumed_at` is set exactly once, by the redemption that wins.
#[derive(Debug, Clone, FromRow)]
pub struct AutologinToken {
    pub token: String,
    pub username: String,
    pub created_at: Timestamp,
    pub consumed_at: Option<Timestamp>,
}

impl AutologinToken {
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}
