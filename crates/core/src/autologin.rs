//! Autologin identifier generation.
//!
//! Identifiers are opaque, fixed-length strings over a 52-letter alphabet
//! drawn from the thread-local CSPRNG.

use rand::Rng;

/// Length of every issued autologin identifier.
pub const AUTOLOGIN_TOKEN_LENGTH: usize = 64;

/// Upper- and lower-case Latin letters.
pub const AUTOLOGIN_ALPHABET: &[u8; 52] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a random identifier of `length` letters.
pub fn generate_autologin_token(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| AUTOLOGIN_ALPHABET[rng.random_range(0..AUTOLOGIN_ALPHABET.len())] as char)
        .collect()
}

/// Whether `candidate` could have been produced by [`generate_autologin_token`].
///
/// Used to reject obviously foreign path segments before touching the store.
pub fn is_well_formed_autologin_token(candidate: &str) -> bool {
    candidate.len() == AUTOLOGIN_TOKEN_LENGTH
        && candidate.bytes().all(|b| b.is_ascii_alphabetic())
}
