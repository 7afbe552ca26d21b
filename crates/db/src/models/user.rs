//! User entity model and DTOs.

use sqlx::FromRow;
use uacl_core::identity::ShortenedUser;
use uacl_core::types::Timestamp;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses.
/// Tokens carry [`ShortenedUser`] instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: Timestamp,
}

impl User {
    pub fn shortened(&self) -> ShortenedUser {
        ShortenedUser::new(&self.name, &self.username)
    }
}

/// DTO for creating a new user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub username: String,
    pub password_hash: String,
}
