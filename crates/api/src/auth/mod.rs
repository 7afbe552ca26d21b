//! Authentication primitives.
//!
//! - [`jwt`] -- RS256 token issuance and validation.
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`autologin`] -- single-use autologin token generation and redemption.

pub mod autologin;
pub mod jwt;
pub mod password;
