//! Common library for the concierge services
//!
//! This crate provides the functionality shared by the authentication and
//! booking services: the table abstraction with its in-memory and PostgreSQL
//! backends, store errors, and database connectivity.

pub mod database;
pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{Direction, FieldValue, Query, Record, SharedTable, Store, Table};
