//! User model and related functionality

use chrono::{DateTime, Utc};
use common::{FieldValue, Record};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub account: UserAccount,
    pub created_at: DateTime<Utc>,
}

/// Sign-in details of a user
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct UserAccount {
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl User {
    pub fn email(&self) -> &str {
        &self.account.email
    }
}

impl Record for User {
    type Key = Uuid;
    type Fields = UserAccount;

    const TABLE: &'static str = "users";
    const KEY_COLUMN: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["id", "email", "password_hash", "created_at"];

    fn key(&self) -> &Uuid {
        &self.id
    }

    fn column(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => Some(self.id.into()),
            "email" => Some(self.account.email.clone().into()),
            "password_hash" => Some(self.account.password_hash.clone().into()),
            "created_at" => Some(self.created_at.into()),
            _ => None,
        }
    }

    fn replace_fields(&mut self, fields: UserAccount) {
        self.account = fields;
    }
}

/// New user registration payload
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// Plain-text password, hashed before it is stored
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::nil(),
            account: UserAccount {
                email: "alice@example.com".to_string(),
                password_hash: "$argon2id$secret".to_string(),
            },
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["id"], Uuid::nil().to_string());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("account").is_none());
    }
}
