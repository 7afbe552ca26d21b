//! Session orchestration: login, signup, refresh, and autologin.
//!
//! Sequences the password guard, token issuer/validator and credential store
//! for each request. Held in [`AppState`](crate::state::AppState) as an
//! `Arc<SessionOrchestrator>`. Every failure returns before any further
//! state is written.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uacl_core::error::CoreError;
use uacl_core::identity::ShortenedUser;
use uacl_core::requests::{AutologinRequest, CreateUserRequest, LoginRequest, RefreshRequest};
use uacl_db::models::token::{StoredTokens, TokenPair};
use uacl_db::models::user::CreateUser;
use uacl_db::{CredentialStore, StoreError};

use crate::auth::autologin::{AutologinFlow, RedeemError};
use crate::auth::jwt::{token_digest, TokenIssuer, TokenKind, TokenValidator};
use crate::auth::password::PasswordGuard;
use crate::config::{AutologinConfig, ServerConfig};
use crate::error::{AppError, AppResult};

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const WRONG_REFRESH_TOKEN: &str = "Wrong refresh token";

/// Response body of `POST /autologin`.
#[derive(Debug, Clone, Serialize)]
pub struct AutologinGrant {
    pub username: String,
    pub token: String,
    pub site: String,
}

/// Composition root of the gateway's request logic.
pub struct SessionOrchestrator {
    store: Arc<dyn CredentialStore>,
    passwords: Arc<dyn PasswordGuard>,
    issuer: TokenIssuer,
    validator: TokenValidator,
    autologin: AutologinFlow,
    autologin_config: AutologinConfig,
}

impl SessionOrchestrator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: Arc<dyn PasswordGuard>,
        issuer: TokenIssuer,
        validator: TokenValidator,
        autologin_config: AutologinConfig,
    ) -> Self {
        Self {
            store,
            passwords,
            issuer,
            validator,
            autologin: AutologinFlow::default(),
            autologin_config,
        }
    }

    /// Load signing keys from the paths in `config` and wire everything up.
    pub fn from_config(
        config: &ServerConfig,
        store: Arc<dyn CredentialStore>,
        passwords: Arc<dyn PasswordGuard>,
    ) -> AppResult<Self> {
        let issuer = TokenIssuer::from_config(&config.jwt)?;
        let validator = TokenValidator::from_config(&config.jwt)?;
        Ok(Self::new(
            store,
            passwords,
            issuer,
            validator,
            config.autologin.clone(),
        ))
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn public_key(&self) -> &str {
        self.validator.public_key_pem()
    }

    /// Resolve the identity behind an access token.
    pub fn authorize(&self, token: &str) -> AppResult<ShortenedUser> {
        Ok(self.validator.validate(token)?)
    }

    /// Exchange username and password for a fresh token pair.
    ///
    /// Unknown users and wrong passwords fail identically.
    pub async fn login(&self, input: LoginRequest) -> AppResult<TokenPair> {
        input.check()?;

        let user = self
            .store
            .find_user_by_username(&input.username)
            .await?
            .ok_or_else(|| CoreError::Unauthorized(INVALID_CREDENTIALS.into()))?;

        let password = input.password;
        let password_hash = user.password_hash.clone();
        let password_valid = self
            .run_guard(move |guard| guard.verify(&password, &password_hash))
            .await?
            .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
        if !password_valid {
            tracing::info!(username = %user.username, "Rejected login");
            return Err(CoreError::Unauthorized(INVALID_CREDENTIALS.into()).into());
        }

        tracing::info!(username = %user.username, "Logging in user");
        self.issue_and_store(&user.shortened()).await
    }

    /// Register a user and sign them in.
    pub async fn create_user(&self, input: CreateUserRequest) -> AppResult<TokenPair> {
        input.check()?;

        let CreateUserRequest {
            name,
            username,
            password,
        } = input;

        let password_hash = self
            .run_guard(move |guard| guard.hash(&password))
            .await?
            .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

        let user = self
            .store
            .create_user(&CreateUser {
                name,
                username,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::DuplicateKey { .. } => {
                    AppError::Core(CoreError::Conflict("Username is already used".into()))
                }
                other => other.into(),
            })?;

        tracing::info!(username = %user.username, "Created user");
        self.issue_and_store(&user.shortened()).await
    }

    /// Rotate a refresh token into a new pair.
    ///
    /// The presented token must verify and must be the one currently stored
    /// for its user. The swap is conditional on the stored digest, so a token
    /// can be rotated at most once even under concurrent use.
    pub async fn refresh(&self, input: RefreshRequest) -> AppResult<TokenPair> {
        let identity = self.validator.validate(&input.refresh_token)?;
        let presented = token_digest(&input.refresh_token);

        let stored = self.store.find_tokens(&identity.username).await?;
        let matches = stored
            .as_ref()
            .is_some_and(|t| t.refresh_token_hash == presented);
        if !matches {
            tracing::warn!(username = %identity.username, "Refresh token does not match stored token");
            return Err(CoreError::Unauthorized(WRONG_REFRESH_TOKEN.into()).into());
        }

        let (pair, record) = self.issue_pair(&identity)?;
        if !self.store.rotate_tokens(&presented, &record).await? {
            tracing::warn!(username = %identity.username, "Refresh token rotated concurrently");
            return Err(CoreError::Unauthorized(WRONG_REFRESH_TOKEN.into()).into());
        }

        tracing::info!(username = %identity.username, "Refreshed token pair");
        Ok(pair)
    }

    /// Mint an autologin token for `input.username` on behalf of `caller`.
    pub async fn create_autologin(
        &self,
        caller: &ShortenedUser,
        input: AutologinRequest,
    ) -> AppResult<AutologinGrant> {
        self.ensure_autologin_creator(caller)?;

        let target = self
            .store
            .find_user_by_username(&input.username)
            .await?
            .ok_or_else(|| CoreError::BadRequest("Unknown user".into()))?;

        let row = self.autologin.issue(self.store.as_ref(), &target).await?;

        Ok(AutologinGrant {
            username: row.username,
            token: row.token,
            site: self.autologin_config.site.clone(),
        })
    }

    /// Fail unless `caller` is on the autologin allow-list.
    pub fn ensure_autologin_creator(&self, caller: &ShortenedUser) -> AppResult<()> {
        if !self.autologin_config.is_allowed(&caller.username) {
            tracing::warn!(username = %caller.username, "Caller may not create autologin tokens");
            return Err(CoreError::Unauthorized("Not authorized".into()).into());
        }
        Ok(())
    }

    /// Spend an autologin token and sign its user in.
    pub async fn redeem_autologin(&self, token: &str) -> AppResult<TokenPair> {
        let user = self
            .autologin
            .redeem(self.store.as_ref(), token)
            .await
            .map_err(|e| match e {
                RedeemError::NotFound | RedeemError::UserMissing => {
                    AppError::Core(CoreError::BadRequest("Invalid autologin token".into()))
                }
                RedeemError::Store(err) => err.into(),
            })?;

        self.issue_and_store(&user.shortened()).await
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Sign a new pair for `identity` without persisting it.
    fn issue_pair(&self, identity: &ShortenedUser) -> AppResult<(TokenPair, StoredTokens)> {
        let token = self.issuer.issue(identity, TokenKind::Access)?;
        let refresh_token = self.issuer.issue(identity, TokenKind::Refresh)?;
        let updated_at = Utc::now();

        let record = StoredTokens {
            username: identity.username.clone(),
            token_hash: token_digest(&token),
            refresh_token_hash: token_digest(&refresh_token),
            updated_at,
        };
        let pair = TokenPair {
            username: identity.username.clone(),
            token,
            refresh_token,
            updated_at,
        };
        Ok((pair, record))
    }

    /// Sign a new pair and make it the user's only active pair.
    async fn issue_and_store(&self, identity: &ShortenedUser) -> AppResult<TokenPair> {
        let (pair, record) = self.issue_pair(identity)?;
        self.store.upsert_tokens(&record).await?;
        Ok(pair)
    }

    /// Run a password operation off the async executor.
    async fn run_guard<T, F>(&self, op: F) -> AppResult<Result<T, argon2::password_hash::Error>>
    where
        T: Send + 'static,
        F: FnOnce(&dyn PasswordGuard) -> Result<T, argon2::password_hash::Error> + Send + 'static,
    {
        let guard = Arc::clone(&self.passwords);
        tokio::task::spawn_blocking(move || op(guard.as_ref()))
            .await
            .map_err(|e| AppError::InternalError(format!("Password task failed: {e}")))
    }
}
