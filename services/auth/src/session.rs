//! In-process registry of issued sessions

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::Session;

/// Tracks every issued, unrevoked session until it expires
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, session: Session) {
        info!("Creating session for user: {}", session.user_id);
        self.sessions.write().await.insert(session.id, session);
    }

    /// The live session with `id`, if any
    pub async fn get(&self, id: Uuid, now: DateTime<Utc>) -> Option<Session> {
        self.sessions
            .read()
            .await
            .get(&id)
            .filter(|session| !session.is_expired(now))
            .cloned()
    }

    /// Remove a session; returns whether it was present
    pub async fn revoke(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id);
        if let Some(session) = &removed {
            info!("Revoked session for user: {}", session.user_id);
        }
        removed.is_some()
    }

    /// Drop expired sessions; returns how many were removed
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        before - sessions.len()
    }
}
