//! Booking management API
//!
//! Bookings, hotel rooms and bearer-authenticated user profiles over HTTP.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod seed;
pub mod state;

pub use state::AppState;
