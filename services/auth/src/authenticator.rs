//! Credential verification and bearer token resolution
//!
//! Every failure is reported as one of two opaque errors: a caller can never
//! tell an unknown email from a wrong password, nor a forged token from an
//! expired or revoked one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    jwt::{Claims, JwtService},
    models::{Session, User},
    repositories::UserRepository,
    session::SessionRegistry,
};

/// Authentication failures
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
}

/// A freshly issued bearer token
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(skip)]
    pub session: Session,
}

fn timestamp(seconds: u64) -> Option<DateTime<Utc>> {
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
}

/// Issues bearer tokens for valid credentials and resolves them to users
#[derive(Clone)]
pub struct SessionAuthenticator {
    users: UserRepository,
    jwt: JwtService,
    sessions: SessionRegistry,
}

impl SessionAuthenticator {
    pub fn new(users: UserRepository, jwt: JwtService) -> Self {
        Self {
            users,
            jwt,
            sessions: SessionRegistry::new(),
        }
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Verify `email`/`password` and issue a token bound to that user
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let user = match self.users.find_by_email(email).await {
            Ok(user) => user,
            Err(e) => {
                error!("Failed to look up user during sign-in: {}", e);
                None
            }
        };

        // an unknown email pays for a verification too
        let verification = match &user {
            Some(user) => self.users.verify_password(user, password).await,
            None => self.users.verify_absent(password).await,
        };
        let verified = verification.unwrap_or_else(|e| {
            error!("Failed to verify password: {}", e);
            false
        });

        let Some(user) = user.filter(|_| verified) else {
            return Err(AuthError::InvalidCredentials);
        };

        let session_id = Uuid::new_v4();
        let (access_token, claims) = self
            .jwt
            .generate_access_token(user.id, session_id)
            .map_err(|e| {
                error!("Failed to generate access token: {}", e);
                AuthError::InvalidCredentials
            })?;

        let (Some(issued_at), Some(expires_at)) = (timestamp(claims.iat), timestamp(claims.exp))
        else {
            error!("Token timestamps out of range for user: {}", user.id);
            return Err(AuthError::InvalidCredentials);
        };
        let session = Session {
            id: session_id,
            user_id: user.id,
            issued_at,
            expires_at,
        };
        self.sessions.register(session.clone()).await;

        info!("Issued access token for user: {}", user.id);
        Ok(IssuedToken {
            access_token,
            token_type: "bearer".to_string(),
            session,
        })
    }

    /// Resolve a bearer token to the user it was issued for
    pub async fn resolve(&self, token: &str) -> Result<User, AuthError> {
        let (claims, _) = self.live_session(token).await?;

        match self.users.find_by_id(claims.sub).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AuthError::InvalidToken),
            Err(e) => {
                error!("Failed to look up user for token: {}", e);
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Revoke the session behind a live token
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let (_, session) = self.live_session(token).await?;
        if self.sessions.revoke(session.id).await {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }

    /// Drop expired sessions from the registry
    pub async fn purge_expired_sessions(&self) -> usize {
        self.sessions.purge_expired(Utc::now()).await
    }

    async fn live_session(&self, token: &str) -> Result<(Claims, Session), AuthError> {
        let claims = self
            .jwt
            .validate_token(token)
            .map_err(|_| AuthError::InvalidToken)?;

        let session = self
            .sessions
            .get(claims.jti, Utc::now())
            .await
            .filter(|session| session.user_id == claims.sub)
            .ok_or(AuthError::InvalidToken)?;

        Ok((claims, session))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::store::memory::MemoryTable;

    use super::*;
    use crate::{jwt::JwtConfig, models::NewUser};

    async fn authenticator(expiry: u64) -> SessionAuthenticator {
        let users = UserRepository::new(Arc::new(MemoryTable::new()));
        for (email, password) in [
            ("alice@example.com", "alice-password"),
            ("bob@example.com", "bob-password"),
        ] {
            users
                .create(&NewUser {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await
                .unwrap();
        }

        let jwt = JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: expiry,
        })
        .unwrap();

        SessionAuthenticator::new(users, jwt)
    }

    #[tokio::test]
    async fn test_authenticate_then_resolve_yields_same_user() {
        let auth = authenticator(900).await;

        for (email, password) in [
            ("alice@example.com", "alice-password"),
            ("bob@example.com", "bob-password"),
        ] {
            let issued = auth.authenticate(email, password).await.unwrap();
            assert_eq!(issued.token_type, "bearer");

            let user = auth.resolve(&issued.access_token).await.unwrap();
            assert_eq!(user.email(), email);
            assert_eq!(user.id, issued.session.user_id);
        }
    }

    #[tokio::test]
    async fn test_invalid_pairs_are_indistinguishable() {
        let auth = authenticator(900).await;

        let wrong_password = auth.authenticate("alice@example.com", "bob-password").await;
        let unknown_user = auth.authenticate("carol@example.com", "alice-password").await;
        let swapped = auth.authenticate("bob@example.com", "alice-password").await;

        assert_eq!(wrong_password.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(unknown_user.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(swapped.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_unknown_email_costs_a_verification() {
        let auth = authenticator(900).await;

        let before = auth.users().verifications();
        let unknown_user = auth.authenticate("carol@example.com", "carol-password").await;
        assert_eq!(unknown_user.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(auth.users().verifications(), before + 1);

        let wrong_password = auth.authenticate("alice@example.com", "carol-password").await;
        assert_eq!(wrong_password.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(auth.users().verifications(), before + 2);
    }

    #[tokio::test]
    async fn test_resolve_rejects_unknown_tokens() {
        let auth = authenticator(900).await;
        assert_eq!(
            auth.resolve("garbage").await.unwrap_err(),
            AuthError::InvalidToken
        );

        // well signed, but never issued
        let other = authenticator(900).await;
        let issued = other
            .authenticate("alice@example.com", "alice-password")
            .await
            .unwrap();
        assert_eq!(
            auth.resolve(&issued.access_token).await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn test_expired_token_resolves_to_nothing() {
        let auth = authenticator(0).await;
        let issued = auth
            .authenticate("alice@example.com", "alice-password")
            .await
            .unwrap();

        assert_eq!(
            auth.resolve(&issued.access_token).await.unwrap_err(),
            AuthError::InvalidToken
        );
        assert_eq!(auth.purge_expired_sessions().await, 1);
    }

    #[tokio::test]
    async fn test_revoked_token_resolves_to_nothing() {
        let auth = authenticator(900).await;
        let issued = auth
            .authenticate("alice@example.com", "alice-password")
            .await
            .unwrap();

        auth.revoke(&issued.access_token).await.unwrap();
        assert_eq!(
            auth.resolve(&issued.access_token).await.unwrap_err(),
            AuthError::InvalidToken
        );
        assert_eq!(
            auth.revoke(&issued.access_token).await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let auth = authenticator(900).await;
        let issued = auth
            .authenticate("alice@example.com", "alice-password")
            .await
            .unwrap();

        let first = auth.resolve(&issued.access_token).await.unwrap();
        let second = auth.resolve(&issued.access_token).await.unwrap();
        assert_eq!(first, second);
    }
}
