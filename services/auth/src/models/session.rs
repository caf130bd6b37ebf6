//! Session model and related functionality

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// An issued bearer token, as tracked by the session registry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    /// Session ID, carried in the token as `jti`
    pub id: Uuid,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is expired from its expiry instant onwards
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
