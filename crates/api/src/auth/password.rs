//! Password hashing and verification.
//!
//! The orchestrator only sees the [`PasswordGuard`] trait. The production
//! guard is [`Argon2Guard`]: Argon2id with a random [`OsRng`] salt, stored in
//! PHC string format so algorithm parameters travel with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// One-way password hashing with constant-time verification.
pub trait PasswordGuard: Send + Sync {
    /// Hash a plaintext password for storage.
    fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error>;

    /// `Ok(false)` on mismatch; `Err` only if `hash` is unusable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error>;
}

/// Argon2id with default parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Guard;

impl PasswordGuard for Argon2Guard {
    fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
        let parsed_hash = PasswordHash::new(hash)?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let guard = Argon2Guard;
        let hash = guard.hash("p1").expect("hashing should succeed");

        assert!(hash.starts_with("$argon2id$"), "expected argon2id PHC prefix");
        assert!(guard.verify("p1", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_fails() {
        let guard = Argon2Guard;
        let hash = guard.hash("real-password").unwrap();
        assert!(!guard.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let guard = Argon2Guard;
        assert_ne!(guard.hash("p1").unwrap(), guard.hash("p1").unwrap());
    }

    #[test]
    fn test_unparsable_hash_is_an_error() {
        assert!(Argon2Guard.verify("p1", "plaintext-not-phc").is_err());
    }
}
