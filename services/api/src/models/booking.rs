//! Booking models for the API service

use chrono::NaiveDate;
use common::{FieldValue, Record};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Booking record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Booking {
    /// Assigned at creation, never changed afterwards
    pub booking_id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub details: BookingDetails,
}

/// Every mutable booking field; also the body of create and update requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BookingDetails {
    pub room_id: String,
    pub hotel_id: String,
    pub booking_date: NaiveDate,
    pub guest_name: String,
    pub guest_phone: String,
    pub payment_method: String,
}

impl Record for Booking {
    type Key = Uuid;
    type Fields = BookingDetails;

    const TABLE: &'static str = "bookings";
    const KEY_COLUMN: &'static str = "booking_id";
    const COLUMNS: &'static [&'static str] = &[
        "booking_id",
        "room_id",
        "hotel_id",
        "booking_date",
        "guest_name",
        "guest_phone",
        "payment_method",
    ];

    fn key(&self) -> &Uuid {
        &self.booking_id
    }

    fn column(&self, column: &str) -> Option<FieldValue> {
        let details = &self.details;
        match column {
            "booking_id" => Some(self.booking_id.into()),
            "room_id" => Some(details.room_id.clone().into()),
            "hotel_id" => Some(details.hotel_id.clone().into()),
            "booking_date" => Some(details.booking_date.into()),
            "guest_name" => Some(details.guest_name.clone().into()),
            "guest_phone" => Some(details.guest_phone.clone().into()),
            "payment_method" => Some(details.payment_method.clone().into()),
            _ => None,
        }
    }

    fn replace_fields(&mut self, fields: BookingDetails) {
        self.details = fields;
    }
}
