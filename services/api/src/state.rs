//! Application state shared across handlers

use auth::{JwtService, RateLimiter, RateLimiterConfig, SessionAuthenticator, UserRepository};
use common::Store;

use crate::repositories::{BookingRepository, HotelRoomRepository, ProfileRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub authenticator: SessionAuthenticator,
    pub rate_limiter: RateLimiter,
    pub booking_repository: BookingRepository,
    pub hotel_room_repository: HotelRoomRepository,
    pub profile_repository: ProfileRepository,
}

impl AppState {
    /// Open every table on `store` and wire the authenticator
    pub fn new(store: Store, jwt_service: JwtService, rate_limiter: RateLimiterConfig) -> Self {
        let user_repository = UserRepository::new(store.table());

        Self {
            authenticator: SessionAuthenticator::new(user_repository, jwt_service),
            rate_limiter: RateLimiter::new(rate_limiter),
            booking_repository: BookingRepository::new(store.table()),
            hotel_room_repository: HotelRoomRepository::new(store.table()),
            profile_repository: ProfileRepository::new(store.table()),
            store,
        }
    }
}
