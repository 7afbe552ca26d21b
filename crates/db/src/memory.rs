//! In-process [`CredentialStore`] for tests and database-less development.
//!
//! All tables sit behind one mutex, so every operation is trivially atomic.
//! Referential checks mirror the foreign keys of the Postgres schema.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::models::autologin::AutologinToken;
use crate::models::token::StoredTokens;
use crate::models::user::{CreateUser, User};
use crate::store::{CredentialStore, StoreError};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    tokens: HashMap<String, StoredTokens>,
    autologin_tokens: HashMap<String, AutologinToken>,
}

#[derive(Default)]
pub struct InMemoryCredentialStore {
    tables: Mutex<Tables>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("credential tables lock poisoned".into()))
    }
}

fn missing_user(username: &str) -> StoreError {
    StoreError::Backend(format!("no user row for '{username}'"))
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        if tables.users.contains_key(&input.username) {
            return Err(StoreError::DuplicateKey { entity: "user" });
        }
        let user = User {
            username: input.username.clone(),
            name: input.name.clone(),
            password_hash: input.password_hash.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(username).cloned())
    }

    async fn upsert_tokens(&self, tokens: &StoredTokens) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&tokens.username) {
            return Err(missing_user(&tokens.username));
        }
        tables
            .tokens
            .insert(tokens.username.clone(), tokens.clone());
        Ok(())
    }

    async fn find_tokens(&self, username: &str) -> Result<Option<StoredTokens>, StoreError> {
        Ok(self.lock()?.tokens.get(username).cloned())
    }

    async fn rotate_tokens(
        &self,
        expected_refresh_hash: &str,
        tokens: &StoredTokens,
    ) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        match tables.tokens.get_mut(&tokens.username) {
            Some(current) if current.refresh_token_hash == expected_refresh_hash => {
                *current = tokens.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_autologin_token(
        &self,
        username: &str,
        token: &str,
    ) -> Result<AutologinToken, StoreError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(username) {
            return Err(missing_user(username));
        }
        if tables.autologin_tokens.contains_key(token) {
            return Err(StoreError::DuplicateKey {
                entity: "autologin token",
            });
        }
        let row = AutologinToken {
            token: token.to_string(),
            username: username.to_string(),
            created_at: Utc::now(),
            consumed_at: None,
        };
        tables.autologin_tokens.insert(row.token.clone(), row.clone());
        Ok(row)
    }

    async fn consume_autologin_token(
        &self,
        token: &str,
    ) -> Result<Option<AutologinToken>, StoreError> {
        let mut tables = self.lock()?;
        match tables.autologin_tokens.get_mut(token) {
            Some(row) if !row.is_consumed() => {
                row.consumed_at = Some(Utc::now());
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;

    fn new_user(username: &str) -> CreateUser {
        CreateUser {
            name: "Alice".into(),
            username: username.into(),
            password_hash: "$argon2id$stub".into(),
        }
    }

    fn tokens(username: &str, refresh: &str) -> StoredTokens {
        StoredTokens {
            username: username.into(),
            token_hash: format!("access-{refresh}"),
            refresh_token_hash: refresh.into(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_classified() {
        let store = InMemoryCredentialStore::new();
        store.create_user(&new_user("alice")).await.unwrap();

        let err = store.create_user(&new_user("alice")).await.unwrap_err();
        assert_matches!(err, StoreError::DuplicateKey { entity: "user" });
    }

    #[tokio::test]
    async fn upsert_overwrites_previous_pair() {
        let store = InMemoryCredentialStore::new();
        store.create_user(&new_user("alice")).await.unwrap();

        store.upsert_tokens(&tokens("alice", "r1")).await.unwrap();
        store.upsert_tokens(&tokens("alice", "r2")).await.unwrap();

        let stored = store.find_tokens("alice").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token_hash, "r2");
        assert_eq!(stored.token_hash, "access-r2");
    }

    #[tokio::test]
    async fn tokens_require_an_existing_user() {
        let store = InMemoryCredentialStore::new();
        let err = store.upsert_tokens(&tokens("ghost", "r1")).await.unwrap_err();
        assert_matches!(err, StoreError::Backend(_));
    }

    #[tokio::test]
    async fn rotation_only_swaps_matching_digest() {
        let store = InMemoryCredentialStore::new();
        store.create_user(&new_user("alice")).await.unwrap();
        store.upsert_tokens(&tokens("alice", "r1")).await.unwrap();

        assert!(!store.rotate_tokens("stale", &tokens("alice", "r2")).await.unwrap());
        assert!(store.rotate_tokens("r1", &tokens("alice", "r2")).await.unwrap());
        assert!(!store.rotate_tokens("r1", &tokens("alice", "r3")).await.unwrap());

        let stored = store.find_tokens("alice").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token_hash, "r2");
    }

    #[tokio::test]
    async fn autologin_token_is_consumed_once() {
        let store = InMemoryCredentialStore::new();
        store.create_user(&new_user("alice")).await.unwrap();
        store.create_autologin_token("alice", "abc").await.unwrap();

        let first = store.consume_autologin_token("abc").await.unwrap();
        assert_eq!(first.unwrap().username, "alice");
        assert!(store.consume_autologin_token("abc").await.unwrap().is_none());
        assert!(store.consume_autologin_token("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_consumption_has_one_winner() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.create_user(&new_user("alice")).await.unwrap();
        store.create_autologin_token("alice", "race").await.unwrap();

        let attempts = (0..16).map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.consume_autologin_token("race").await })
        });
        let results = futures::future::join_all(attempts).await;

        let winners = results
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .filter(Option::is_some)
            .count();
        assert_eq!(winners, 1);
    }
}
