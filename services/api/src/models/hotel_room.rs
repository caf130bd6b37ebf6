//! Hotel room models for the API service

use common::{FieldValue, Record};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Hotel room record; provisioned outside the HTTP surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HotelRoom {
    pub room_id: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub details: RoomDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RoomDetails {
    pub hotel_id: String,
    pub room_type: String,
    /// Nightly price in US dollars
    #[serde(rename = "price_USD")]
    pub price_usd: f64,
}

impl Record for HotelRoom {
    type Key = String;
    type Fields = RoomDetails;

    const TABLE: &'static str = "hotel_rooms";
    const KEY_COLUMN: &'static str = "room_id";
    const COLUMNS: &'static [&'static str] = &["room_id", "hotel_id", "room_type", "price_usd"];

    fn key(&self) -> &String {
        &self.room_id
    }

    fn column(&self, column: &str) -> Option<FieldValue> {
        match column {
            "room_id" => Some(self.room_id.clone().into()),
            "hotel_id" => Some(self.details.hotel_id.clone().into()),
            "room_type" => Some(self.details.room_type.clone().into()),
            "price_usd" => Some(self.details.price_usd.into()),
            _ => None,
        }
    }

    fn replace_fields(&mut self, fields: RoomDetails) {
        self.details = fields;
    }
}

/// Query parameters for hotel room search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HotelRoomQuery {
    /// Filter by room type; empty means no filter
    pub room_type: Option<String>,
    /// Sort by price ascending; absent or false sorts descending
    pub is_ascending: Option<bool>,
}

impl HotelRoomQuery {
    pub fn room_type(&self) -> Option<&str> {
        self.room_type.as_deref().filter(|room_type| !room_type.is_empty())
    }

    pub fn is_ascending(&self) -> bool {
        self.is_ascending.unwrap_or(false)
    }
}
