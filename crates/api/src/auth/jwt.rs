//! Signed token issuance and validation.
//!
//! Access and refresh tokens share one claim shape ([`Claims`]) and differ only
//! in their expiry window ([`TokenKind`]). Both are RS256 JWTs. The algorithm
//! is a constant: the issuer can only be built from an RSA private key and the
//! validator refuses any header that does not declare [`SIGNING_ALGORITHM`]
//! before a key is ever consulted, so HMAC/`none` confusion is not reachable.
//!
//! Only SHA-256 digests of issued tokens are persisted (see [`token_digest`]).

use std::path::{Path, PathBuf};

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uacl_core::identity::ShortenedUser;
use uuid::Uuid;

/// The one algorithm this service signs with and accepts.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

/// Default access token expiry in minutes.
pub const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
pub const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;
/// Upper bound on `JWT_ACCESS_EXPIRY_MINS` (one year).
pub const MAX_ACCESS_EXPIRY_MINS: i64 = 365 * 24 * 60;
/// Upper bound on `JWT_REFRESH_EXPIRY_DAYS` (ten years).
pub const MAX_REFRESH_EXPIRY_DAYS: i64 = 10 * 365;

/// Which expiry policy a token is issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The identity the token speaks for.
    pub dat: ShortenedUser,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Not-before time; always equal to `iat`.
    pub nbf: i64,
    /// Unique token identifier (UUID v4), so two tokens minted in the same
    /// second never collide.
    pub jti: String,
}

/// Failure while issuing or validating a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Key source unavailable: {0}")]
    KeySourceUnavailable(String),

    #[error("Signing failed: {0}")]
    SigningFailure(String),

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token is malformed")]
    MalformedToken,

    #[error("Token is expired or not yet valid")]
    TokenExpired,

    #[error("Token claims are malformed: {0}")]
    MalformedClaims(String),

    #[error("Token signing algorithm {0} is not accepted")]
    AlgorithmRejected(String),
}

/// Key locations and expiry windows.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// PEM RSA private key (PKCS#1 or PKCS#8).
    pub private_key_path: PathBuf,
    /// PEM RSA public key.
    pub public_key_path: PathBuf,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

impl JwtConfig {
    /// Lifetime in seconds of a token of the given kind.
    pub fn window_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_token_expiry_mins.saturating_mul(60),
            TokenKind::Refresh => self.refresh_token_expiry_days.saturating_mul(24 * 60 * 60),
        }
    }
}

fn read_key(path: &Path) -> Result<String, TokenError> {
    std::fs::read_to_string(path)
        .map_err(|e| TokenError::KeySourceUnavailable(format!("{}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Issuer
// ---------------------------------------------------------------------------

/// Signs tokens with the service's RSA private key.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    access_window_secs: i64,
    refresh_window_secs: i64,
}

impl TokenIssuer {
    /// Load the private key named by `config`.
    pub fn from_config(config: &JwtConfig) -> Result<Self, TokenError> {
        let pem = read_key(&config.private_key_path)?;
        Self::from_pem(
            pem.as_bytes(),
            config.window_secs(TokenKind::Access),
            config.window_secs(TokenKind::Refresh),
        )
    }

    pub fn from_pem(
        private_key_pem: &[u8],
        access_window_secs: i64,
        refresh_window_secs: i64,
    ) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(|e| TokenError::KeySourceUnavailable(e.to_string()))?;
        Ok(Self {
            encoding_key,
            access_window_secs,
            refresh_window_secs,
        })
    }

    /// Sign a token for `identity` valid from now until the end of the
    /// `kind` window.
    pub fn issue(&self, identity: &ShortenedUser, kind: TokenKind) -> Result<String, TokenError> {
        self.issue_at(identity, kind, Utc::now().timestamp())
    }

    fn issue_at(
        &self,
        identity: &ShortenedUser,
        kind: TokenKind,
        now: i64,
    ) -> Result<String, TokenError> {
        let window = match kind {
            TokenKind::Access => self.access_window_secs,
            TokenKind::Refresh => self.refresh_window_secs,
        };
        let claims = Claims {
            dat: identity.clone(),
            exp: now.saturating_add(window),
            iat: now,
            nbf: now,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::SigningFailure(e.to_string()))?;

        tracing::debug!(username = %identity.username, ?kind, "Issued token");
        Ok(token)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("access_window_secs", &self.access_window_secs)
            .field("refresh_window_secs", &self.refresh_window_secs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct IdentityClaim {
    dat: serde_json::Value,
}

/// Verifies tokens against the service's RSA public key.
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    public_key_pem: String,
}

impl TokenValidator {
    /// Load the public key named by `config`.
    pub fn from_config(config: &JwtConfig) -> Result<Self, TokenError> {
        let pem = read_key(&config.public_key_path)?;
        Self::from_pem(pem)
    }

    pub fn from_pem(public_key_pem: String) -> Result<Self, TokenError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| TokenError::KeySourceUnavailable(e.to_string()))?;

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "nbf", "iat"]);

        Ok(Self {
            decoding_key,
            validation,
            public_key_pem,
        })
    }

    /// The PEM text of the trusted public key.
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    /// Verify `token` and return the identity it carries.
    pub fn validate(&self, token: &str) -> Result<ShortenedUser, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::MalformedToken)?;
        if header.alg != SIGNING_ALGORITHM {
            return Err(TokenError::AlgorithmRejected(format!("{:?}", header.alg)));
        }

        let data = decode::<IdentityClaim>(token, &self.decoding_key, &self.validation)
            .map_err(classify_decode_error)?;

        let identity: ShortenedUser = serde_json::from_value(data.claims.dat)
            .map_err(|e| TokenError::MalformedClaims(e.to_string()))?;
        if !identity.is_well_formed() {
            return Err(TokenError::MalformedClaims("empty username".into()));
        }

        Ok(identity)
    }
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

fn classify_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::Crypto(_) => TokenError::SignatureInvalid,
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => TokenError::TokenExpired,
        ErrorKind::InvalidAlgorithm => TokenError::AlgorithmRejected("mismatched key".into()),
        ErrorKind::MissingRequiredClaim(claim) => {
            TokenError::MalformedClaims(format!("missing {claim}"))
        }
        ErrorKind::Json(e) => TokenError::MalformedClaims(e.to_string()),
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
            TokenError::KeySourceUnavailable(err.to_string())
        }
        _ => TokenError::MalformedToken,
    }
}

/// SHA-256 hex digest of a token, the only form in which tokens are stored.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
