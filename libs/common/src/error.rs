//! Custom error types for the common library
//!
//! This module defines the error types raised by the store abstraction and
//! by the database connection layer.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database connectivity
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised by table operations, whatever the backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No record carries the requested key
    #[error("No record with key {key} in {table}")]
    NotFound { table: &'static str, key: String },

    /// A record with the same key already exists
    #[error("Duplicate key {key} in {table}")]
    DuplicateKey { table: &'static str, key: String },

    /// The query names a column the table does not declare
    #[error("Invalid query on {table}: {reason}")]
    InvalidQuery { table: &'static str, reason: String },

    /// The backend could not serve the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(table: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            table,
            key: key.to_string(),
        }
    }

    pub fn duplicate_key(table: &'static str, key: impl ToString) -> Self {
        Self::DuplicateKey {
            table,
            key: key.to_string(),
        }
    }

    pub fn unknown_column(table: &'static str, column: &str) -> Self {
        Self::InvalidQuery {
            table,
            reason: format!("unknown column {column}"),
        }
    }

    /// Translate a sqlx failure on `table` into a store error
    pub fn from_sqlx(table: &'static str, key: impl ToString, err: SqlxError) -> Self {
        match err {
            SqlxError::RowNotFound => Self::not_found(table, key),
            SqlxError::Database(db) if db.is_unique_violation() => Self::duplicate_key(table, key),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
