//! Repositories binding API operations to store tables

pub mod booking;
pub mod hotel_room;
pub mod profile;

pub use booking::BookingRepository;
pub use hotel_room::HotelRoomRepository;
pub use profile::ProfileRepository;
