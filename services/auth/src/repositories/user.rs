//! User repository backed by a store table

use std::sync::OnceLock;
#[cfg(test)]
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::Utc;
use common::{Query, SharedTable, StoreError, StoreResult};
use tracing::info;
use uuid::Uuid;

use crate::{
    models::{NewUser, User, UserAccount},
    validation::{validate_email, validate_password},
};

/// Emails are matched case-insensitively
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// Hash checked when no user matches, so a miss costs as much as a mismatch
fn absent_user_hash() -> Result<&'static str> {
    static ABSENT_USER_HASH: OnceLock<String> = OnceLock::new();

    if let Some(hash) = ABSENT_USER_HASH.get() {
        return Ok(hash);
    }
    let hash = hash_password("absent-user-password")?;
    Ok(ABSENT_USER_HASH.get_or_init(|| hash))
}

fn verify_hash(password_hash: &str, password: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    table: SharedTable<User>,
    #[cfg(test)]
    verifications: Arc<AtomicUsize>,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(table: SharedTable<User>) -> Self {
        Self {
            table,
            #[cfg(test)]
            verifications: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register a new user, hashing the password with argon2
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let email = normalize_email(&new_user.email);
        info!("Creating new user: {}", email);

        validate_email(&email)?;
        validate_password(&new_user.password)?;

        if self.find_by_email(&email).await?.is_some() {
            anyhow::bail!("A user with email {} already exists", email);
        }

        let password = new_user.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        let user = User {
            id: Uuid::new_v4(),
            account: UserAccount {
                email,
                password_hash,
            },
            created_at: Utc::now(),
        };

        Ok(self.table.insert(user).await?)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let query = Query::new().eq("email", normalize_email(email));
        let mut users = self.table.select_all(&query).await?;
        Ok(if users.is_empty() {
            None
        } else {
            Some(users.swap_remove(0))
        })
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        match self.table.select_by_key(&id).await {
            Ok(user) => Ok(Some(user)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Verify a user's password
    pub async fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        self.verify(Some(user.account.password_hash.clone()), password)
            .await
    }

    /// Run a verification that always fails, for a sign-in with no matching user
    pub async fn verify_absent(&self, password: &str) -> Result<bool> {
        self.verify(None, password).await?;
        Ok(false)
    }

    async fn verify(&self, password_hash: Option<String>, password: &str) -> Result<bool> {
        #[cfg(test)]
        self.verifications.fetch_add(1, Ordering::SeqCst);

        let password = password.to_string();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            match password_hash {
                Some(password_hash) => verify_hash(&password_hash, &password),
                None => verify_hash(absent_user_hash()?, &password),
            }
        })
        .await?
    }

    #[cfg(test)]
    pub(crate) fn verifications(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::store::memory::MemoryTable;

    use super::*;

    fn repository() -> UserRepository {
        UserRepository::new(Arc::new(MemoryTable::new()))
    }

    fn alice() -> NewUser {
        NewUser {
            email: "Alice@Example.com".to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password_and_normalizes_email() {
        let repository = repository();
        let user = repository.create(&alice()).await.unwrap();

        assert_eq!(user.email(), "alice@example.com");
        assert_ne!(user.account.password_hash, "correct horse");
        assert!(user.account.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_find_by_email_is_case_insensitive() {
        let repository = repository();
        let created = repository.create(&alice()).await.unwrap();

        let found = repository.find_by_email(" ALICE@example.COM ").await.unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(repository.find_by_email("bob@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let repository = repository();
        let created = repository.create(&alice()).await.unwrap();

        assert_eq!(
            repository.find_by_id(created.id).await.unwrap(),
            Some(created)
        );
        assert_eq!(repository.find_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let repository = repository();
        repository.create(&alice()).await.unwrap();

        let err = repository.create(&alice()).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let repository = repository();

        let bad_email = NewUser {
            email: "not-an-email".to_string(),
            password: "correct horse".to_string(),
        };
        assert!(repository.create(&bad_email).await.is_err());

        let short_password = NewUser {
            email: "bob@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(repository.create(&short_password).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_password() {
        let repository = repository();
        let user = repository.create(&alice()).await.unwrap();

        assert!(repository.verify_password(&user, "correct horse").await.unwrap());
        assert!(!repository.verify_password(&user, "wrong horse").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_absent_never_matches() {
        let repository = repository();

        assert!(!repository.verify_absent("absent-user-password").await.unwrap());
        assert!(!repository.verify_absent("correct horse").await.unwrap());
        assert_eq!(repository.verifications(), 2);
    }
}
