//! Booking repository

use common::{Query, Record, SharedTable, StoreError, StoreResult};
use tracing::info;
use uuid::Uuid;

use crate::models::{Booking, BookingDetails};

/// Booking repository for store operations
#[derive(Clone)]
pub struct BookingRepository {
    table: SharedTable<Booking>,
}

impl BookingRepository {
    /// Create a new booking repository
    pub fn new(table: SharedTable<Booking>) -> Self {
        Self { table }
    }

    /// Get all bookings
    pub async fn list(&self) -> StoreResult<Vec<Booking>> {
        self.table.select_all(&Query::new()).await
    }

    /// Bookings carrying `booking_id`: empty, or exactly one
    ///
    /// An ID that is not a UUID matches nothing.
    pub async fn find_by_id(&self, booking_id: &str) -> StoreResult<Vec<Booking>> {
        let Ok(booking_id) = Uuid::parse_str(booking_id) else {
            return Ok(Vec::new());
        };

        self.table
            .select_all(&Query::new().eq("booking_id", booking_id))
            .await
    }

    /// Create a booking under a freshly assigned ID
    pub async fn create(&self, details: BookingDetails) -> StoreResult<Booking> {
        let booking = Booking {
            booking_id: Uuid::new_v4(),
            details,
        };
        info!("Creating booking {} for room {}", booking.booking_id, booking.details.room_id);
        self.table.insert(booking).await
    }

    /// Replace every field of a booking except its ID
    pub async fn update(&self, booking_id: &str, details: BookingDetails) -> StoreResult<Booking> {
        info!("Updating booking {}", booking_id);
        let key = parse_key(booking_id)?;
        self.table.update(&key, details).await
    }

    pub async fn delete(&self, booking_id: &str) -> StoreResult<()> {
        info!("Deleting booking {}", booking_id);
        let key = parse_key(booking_id)?;
        self.table.delete(&key).await
    }
}

/// No booking can exist under an ID that is not a UUID
fn parse_key(booking_id: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(booking_id).map_err(|_| StoreError::not_found(Booking::TABLE, booking_id))
}
