//! API models for stored records and request payloads

pub mod booking;
pub mod hotel_room;
pub mod profile;

pub use booking::{Booking, BookingDetails};
pub use hotel_room::{HotelRoom, HotelRoomQuery, RoomDetails};
pub use profile::{Profile, ProfileDetails};
