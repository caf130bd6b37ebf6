//! Hotel room repository

use common::{Direction, Query, SharedTable, StoreResult};

use crate::models::HotelRoom;

/// Hotel room repository for store operations
#[derive(Clone)]
pub struct HotelRoomRepository {
    table: SharedTable<HotelRoom>,
}

impl HotelRoomRepository {
    pub fn new(table: SharedTable<HotelRoom>) -> Self {
        Self { table }
    }

    /// Rooms of `room_type` (all rooms when `None`), ordered by price
    ///
    /// Descending unless `ascending` is set, so the most expensive rooms come
    /// first by default.
    pub async fn search(
        &self,
        room_type: Option<&str>,
        ascending: bool,
    ) -> StoreResult<Vec<HotelRoom>> {
        let mut query = Query::new();
        if let Some(room_type) = room_type {
            query = query.eq("room_type", room_type);
        }

        let direction = if ascending {
            Direction::Ascending
        } else {
            Direction::Descending
        };

        self.table
            .select_all(&query.order_by("price_usd", direction))
            .await
    }

    /// Provision a room
    pub async fn insert(&self, room: HotelRoom) -> StoreResult<HotelRoom> {
        self.table.insert(room).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::store::memory::MemoryTable;

    use super::*;
    use crate::models::RoomDetails;

    async fn repository(rooms: &[(&str, &str, f64)]) -> HotelRoomRepository {
        let repository = HotelRoomRepository::new(Arc::new(MemoryTable::new()));
        for (room_id, room_type, price_usd) in rooms {
            repository
                .insert(HotelRoom {
                    room_id: room_id.to_string(),
                    details: RoomDetails {
                        hotel_id: "H1".to_string(),
                        room_type: room_type.to_string(),
                        price_usd: *price_usd,
                    },
                })
                .await
                .unwrap();
        }
        repository
    }

    fn prices(rooms: &[HotelRoom]) -> Vec<f64> {
        rooms.iter().map(|room| room.details.price_usd).collect()
    }

    #[tokio::test]
    async fn test_search_orders_by_price() {
        let repository =
            repository(&[("R1", "single", 50.0), ("R2", "suite", 200.0), ("R3", "double", 75.0)])
                .await;

        let ascending = repository.search(None, true).await.unwrap();
        assert_eq!(prices(&ascending), [50.0, 75.0, 200.0]);

        let default = repository.search(None, false).await.unwrap();
        assert_eq!(prices(&default), [200.0, 75.0, 50.0]);
    }

    #[tokio::test]
    async fn test_search_filters_by_room_type() {
        let repository = repository(&[
            ("R1", "suite", 300.0),
            ("R2", "double", 90.0),
            ("R3", "suite", 250.0),
            ("R4", "Suite", 100.0),
        ])
        .await;

        let suites = repository.search(Some("suite"), false).await.unwrap();
        let ids: Vec<&str> = suites.iter().map(|room| room.room_id.as_str()).collect();
        assert_eq!(ids, ["R1", "R3"]);

        assert!(repository.search(Some("penthouse"), true).await.unwrap().is_empty());
    }
}
