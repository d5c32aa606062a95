//! Identity provider collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

use super::model::Identity;
use crate::error::AuthError;

/// Authenticates users and reports the current identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError>;

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The identity of a session persisted by the provider, if any.
    async fn current_identity(&self) -> Result<Option<Identity>, AuthError>;
}

struct Account {
    password: SecretString,
    identity: Identity,
}

/// In-process identity provider for local runs and tests.
///
/// Accounts live in memory; one provider instance models one device, so it
/// tracks a single current identity.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    current: RwLock<Option<Identity>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing account, e.g. one that already carries profile
    /// metadata from a previous device.
    pub async fn insert_account(&self, identity: Identity, password: &str) {
        self.accounts.write().await.insert(
            normalize(&identity.email),
            Account {
                password: SecretString::from(password),
                identity,
            },
        );
    }

    /// Pretend the provider already holds a persisted session (page reload).
    pub async fn set_current(&self, identity: Option<Identity>) {
        *self.current.write().await = identity;
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        let identity = {
            let accounts = self.accounts.read().await;
            let account = accounts
                .get(&normalize(email))
                .ok_or(AuthError::InvalidCredentials)?;
            if account.password.expose_secret() != password.expose_secret() {
                return Err(AuthError::InvalidCredentials);
            }
            account.identity.clone()
        };
        *self.current.write().await = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Identity, AuthError> {
        let key = normalize(email);
        let identity = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&key) {
                return Err(AuthError::AccountExists {
                    email: email.trim().to_string(),
                });
            }
            let identity = Identity::new(email.trim());
            accounts.insert(
                key,
                Account {
                    password: password.clone(),
                    identity: identity.clone(),
                },
            );
            identity
        };
        *self.current.write().await = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.current.write().await = None;
        Ok(())
    }

    async fn current_identity(&self) -> Result<Option<Identity>, AuthError> {
        Ok(self.current.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s)
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let provider = MemoryIdentityProvider::new();
        let created = provider
            .sign_up("Ada@Example.com", &secret("Analytical1"))
            .await
            .unwrap();
        assert!(created.metadata.is_empty());

        provider.sign_out().await.unwrap();
        assert!(provider.current_identity().await.unwrap().is_none());

        let signed_in = provider
            .sign_in("ada@example.com", &secret("Analytical1"))
            .await
            .unwrap();
        assert_eq!(signed_in.id, created.id);
        assert_eq!(provider.current_identity().await.unwrap(), Some(signed_in));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let provider = MemoryIdentityProvider::new();
        provider.insert_account(Identity::new("a@b.co"), "right").await;
        let err = provider.sign_in("a@b.co", &secret("wrong")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(provider.current_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_rejected() {
        let provider = MemoryIdentityProvider::new();
        provider.sign_up("a@b.co", &secret("Passw0rd!")).await.unwrap();
        let err = provider
            .sign_up("A@B.CO", &secret("Passw0rd!"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountExists { .. }));
    }
}
