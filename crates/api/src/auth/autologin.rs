//! Single-use autologin tokens.
//!
//! An allow-listed caller mints a token for a target user; anyone holding the
//! token may exchange it, once, for a session as that user.

use uacl_core::autologin::{
    generate_autologin_token, is_well_formed_autologin_token, AUTOLOGIN_TOKEN_LENGTH,
};
use uacl_db::models::autologin::AutologinToken;
use uacl_db::models::user::User;
use uacl_db::{CredentialStore, StoreError};

/// Why a redemption did not yield a user.
#[derive(Debug, thiserror::Error)]
pub enum RedeemError {
    /// Unknown, malformed, or already consumed.
    #[error("Autologin token not found")]
    NotFound,

    /// The token was valid but its user no longer exists.
    #[error("Autologin user no longer exists")]
    UserMissing,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Generates and redeems autologin tokens against a [`CredentialStore`].
#[derive(Debug, Clone, Copy)]
pub struct AutologinFlow {
    token_length: usize,
}

impl Default for AutologinFlow {
    fn default() -> Self {
        Self {
            token_length: AUTOLOGIN_TOKEN_LENGTH,
        }
    }
}

impl AutologinFlow {
    pub fn generate(&self) -> String {
        generate_autologin_token(self.token_length)
    }

    /// Mint and persist a fresh token bound to `target`.
    pub async fn issue(
        &self,
        store: &dyn CredentialStore,
        target: &User,
    ) -> Result<AutologinToken, StoreError> {
        let token = self.generate();
        let row = store.create_autologin_token(&target.username, &token).await?;
        tracing::info!(username = %target.username, "Created autologin token");
        Ok(row)
    }

    /// Consume `token` and resolve the user it was minted for.
    ///
    /// Consumption is a single check-and-set in the store, so under
    /// concurrent redemption exactly one caller gets the user.
    pub async fn redeem(
        &self,
        store: &dyn CredentialStore,
        token: &str,
    ) -> Result<User, RedeemError> {
        if !is_well_formed_autologin_token(token) {
            return Err(RedeemError::NotFound);
        }

        let consumed = store
            .consume_autologin_token(token)
            .await?
            .ok_or(RedeemError::NotFound)?;

        let user = store
            .find_user_by_username(&consumed.username)
            .await?
            .ok_or(RedeemError::UserMissing)?;

        tracing::info!(username = %user.username, "Redeemed autologin token");
        Ok(user)
    }
}
