//! The identity claim embedded in every signed token.

use serde::{Deserialize, Serialize};

/// Minimal, secret-free view of a user carried in the `dat` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenedUser {
    pub name: String,
    pub username: String,
}

impl ShortenedUser {
    pub fn new(name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
        }
    }

    /// A claim is well-formed when it names a user. `name` may be empty.
    pub fn is_well_formed(&self) -> bool {
        !self.username.trim().is_empty()
    }
}
