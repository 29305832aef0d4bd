use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::users::error::CredentialError;
use crate::users::password::{
    dummy_hash, hash_password_async, verify_dummy_async, verify_password_async,
};
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, UserRecord};

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Authenticated(UserRecord),
    NoSuchUser(String),
    PasswordMismatch,
}

/// Owns the user record lifecycle: hash on write, compare on read.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn UserStore>,
}

fn require_username(value: &str) -> Result<&str, CredentialError> {
    if value.trim().is_empty() {
        return Err(CredentialError::Validation("username is required".into()));
    }
    Ok(value)
}

// Presence only; any non-empty password is accepted.
fn require_password(value: &str) -> Result<&str, CredentialError> {
    if value.is_empty() {
        return Err(CredentialError::Validation("password is required".into()));
    }
    Ok(value)
}

impl CredentialStore {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        // Built up front so the first unknown-user login doesn't also pay for a hash.
        dummy_hash();
        Self { store }
    }

    pub async fn list_all(&self) -> Result<Vec<UserRecord>, CredentialError> {
        Ok(self.store.list().await?)
    }

    pub async fn create(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<UserRecord, CredentialError> {
        let username = require_username(username)?;
        require_password(password)?;
        let email = email.map(str::trim).filter(|e| !e.is_empty());

        let password_hash = hash_password_async(password.to_owned()).await?;
        let user = self
            .store
            .insert(NewUser {
                username: username.to_owned(),
                password_hash,
                email: email.map(str::to_owned),
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, CredentialError> {
        Ok(self.store.find_by_username(username).await?)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, CredentialError> {
        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<VerifyResult, CredentialError> {
        require_username(username)?;
        require_password(password)?;

        let Some(user) = self.find_by_username(username).await? else {
            // Burn a comparison so unknown users take as long as wrong passwords.
            verify_dummy_async(password.to_owned()).await;
            warn!(username = %username, "login unknown username");
            return Ok(VerifyResult::NoSuchUser(username.to_owned()));
        };

        let matched =
            verify_password_async(password.to_owned(), user.password_hash.clone()).await?;
        if !matched {
            warn!(user_id = %user.id, username = %user.username, "login invalid password");
            return Ok(VerifyResult::PasswordMismatch);
        }

        debug!(user_id = %user.id, "password verified");
        Ok(VerifyResult::Authenticated(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use crate::users::error::StoreError;
    use crate::users::memory::MemoryUserStore;

    fn credentials() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryUserStore::new()))
    }

    #[tokio::test]
    async fn alice_scenario() {
        let creds = credentials();
        let alice = creds.create("alice", "s3cr3t", None).await.unwrap();
        assert_eq!(alice.username, "alice");
        assert_ne!(alice.password_hash, "s3cr3t");

        match creds.verify("alice", "s3cr3t").await.unwrap() {
            VerifyResult::Authenticated(user) => assert_eq!(user, alice),
            other => panic!("expected authenticated, got {other:?}"),
        }
        assert_eq!(
            creds.verify("alice", "wrong").await.unwrap(),
            VerifyResult::PasswordMismatch
        );
        assert_eq!(
            creds.verify("bob", "s3cr3t").await.unwrap(),
            VerifyResult::NoSuchUser("bob".into())
        );

        let all = creds.list_all().await.unwrap();
        assert_eq!(all, vec![alice]);
    }

    #[tokio::test]
    async fn create_keeps_email() {
        let creds = credentials();
        let user = creds
            .create("carol", "hunter2", Some("carol@example.com"))
            .await
            .unwrap();
        let VerifyResult::Authenticated(found) = creds.verify("carol", "hunter2").await.unwrap()
        else {
            panic!("expected authenticated");
        };
        assert_eq!(found.email.as_deref(), Some("carol@example.com"));
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn blank_email_is_dropped() {
        let creds = credentials();
        let user = creds.create("dave", "pw", Some("  ")).await.unwrap();
        assert!(user.email.is_none());
    }

    #[tokio::test]
    async fn repeated_find_by_id_is_stable() {
        let creds = credentials();
        let user = creds.create("erin", "pw", None).await.unwrap();
        let id = user.id.to_string();
        let first = creds.find_by_id(&id).await.unwrap();
        let second = creds.find_by_id(&id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Some(user));

        let never = uuid::Uuid::new_v4().to_string();
        assert!(creds.find_by_id(&never).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_id_surfaces_lookup_error() {
        let creds = credentials();
        let err = creds.find_by_id("507f1f77bcf86cd799439011").await.unwrap_err();
        assert!(matches!(err, CredentialError::Store(StoreError::Lookup(_))));
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let creds = credentials();
        creds.create("frank", "one", None).await.unwrap();
        let err = creds.create("frank", "two", None).await.unwrap_err();
        assert!(matches!(err, CredentialError::Store(StoreError::UsernameTaken(_))));
        assert_eq!(creds.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_fields_are_validation_errors() {
        let creds = credentials();
        assert!(matches!(
            creds.create("", "pw", None).await,
            Err(CredentialError::Validation(_))
        ));
        assert!(matches!(
            creds.create("  ", "pw", None).await,
            Err(CredentialError::Validation(_))
        ));
        assert!(matches!(
            creds.create("grace", "", None).await,
            Err(CredentialError::Validation(_))
        ));
        assert!(matches!(
            creds.verify("grace", "").await,
            Err(CredentialError::Validation(_))
        ));
        assert!(creds.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn whitespace_password_is_a_present_password() {
        let creds = credentials();
        creds.create("ivan", "   ", None).await.unwrap();
        assert!(matches!(
            creds.verify("ivan", "   ").await.unwrap(),
            VerifyResult::Authenticated(_)
        ));
        assert_eq!(
            creds.verify("ivan", " ").await.unwrap(),
            VerifyResult::PasswordMismatch
        );
    }

    #[test]
    fn dummy_hash_is_ready_after_construction() {
        let _creds = credentials();
        assert!(crate::users::password::DUMMY.get().is_some());
    }

    #[tokio::test]
    async fn unknown_user_costs_about_as_much_as_mismatch() {
        let creds = credentials();
        creds.create("judy", "s3cr3t", None).await.unwrap();

        // Warm up both paths once.
        creds.verify("judy", "wrong").await.unwrap();
        creds.verify("nobody", "wrong").await.unwrap();

        let started = Instant::now();
        let mismatch = creds.verify("judy", "wrong").await.unwrap();
        let mismatch_time = started.elapsed();

        let started = Instant::now();
        let unknown = creds.verify("nobody", "wrong").await.unwrap();
        let unknown_time = started.elapsed();

        assert_eq!(mismatch, VerifyResult::PasswordMismatch);
        assert_eq!(unknown, VerifyResult::NoSuchUser("nobody".into()));
        // Without the dummy comparison the unknown path is a map lookup, orders
        // of magnitude faster than an Argon2 verify.
        assert!(
            unknown_time >= mismatch_time / 4,
            "unknown user took {unknown_time:?}, mismatch took {mismatch_time:?}"
        );
    }

    #[tokio::test]
    async fn find_by_username_is_exact() {
        let creds = credentials();
        creds.create("heidi", "pw", None).await.unwrap();
        assert!(creds.find_by_username("heidi").await.unwrap().is_some());
        assert!(creds.find_by_username("heid").await.unwrap().is_none());
    }
}
