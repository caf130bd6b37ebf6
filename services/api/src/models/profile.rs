//! Profile model for the API service

use common::{FieldValue, Record};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Display attributes of a user, keyed by the user's ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub details: ProfileDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProfileDetails {
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Record for Profile {
    type Key = Uuid;
    type Fields = ProfileDetails;

    const TABLE: &'static str = "profiles";
    const KEY_COLUMN: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["id", "display_name", "avatar_url"];

    fn key(&self) -> &Uuid {
        &self.id
    }

    fn column(&self, column: &str) -> Option<FieldValue> {
        match column {
            "id" => Some(self.id.into()),
            "display_name" => Some(self.details.display_name.clone().into()),
            "avatar_url" => Some(self.details.avatar_url.clone().into()),
            _ => None,
        }
    }

    fn replace_fields(&mut self, fields: ProfileDetails) {
        self.details = fields;
    }
}
