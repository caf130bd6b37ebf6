//! Table abstraction shared by every resource the services persist
//!
//! A [`Record`] declares its table name, its columns and its unique key. A
//! [`Table`] stores records of one type and answers equality-filtered,
//! optionally ordered selections. Two backends implement it: an in-process
//! [`memory::MemoryTable`] and a PostgreSQL [`postgres::PgTable`].

use std::{cmp::Ordering, fmt, hash::Hash, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

pub mod memory;
pub mod postgres;

use memory::MemoryTable;
use postgres::PgTable;

/// A single column value, used for filtering, ordering and parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Null,
}

impl FieldValue {
    fn rank(&self) -> u8 {
        match self {
            FieldValue::Text(_) => 0,
            FieldValue::Number(_) => 1,
            FieldValue::Uuid(_) => 2,
            FieldValue::Date(_) => 3,
            FieldValue::Timestamp(_) => 4,
            FieldValue::Null => 5,
        }
    }

    /// Total order used when sorting records; nulls sort last
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// A row type stored in a [`Table`]
pub trait Record: Clone + Send + Sync + 'static {
    /// Unique key type
    type Key: Clone + Eq + Hash + fmt::Display + Into<FieldValue> + Send + Sync + 'static;
    /// Every mutable field, replaced as a whole on update
    type Fields: Send + 'static;

    /// Table name
    const TABLE: &'static str;
    /// Column holding the key
    const KEY_COLUMN: &'static str;
    /// Every column, key column included
    const COLUMNS: &'static [&'static str];

    fn key(&self) -> &Self::Key;

    /// Value of `column`, or `None` when the record has no such column
    fn column(&self, column: &str) -> Option<FieldValue>;

    fn replace_fields(&mut self, fields: Self::Fields);
}

/// Sort direction for [`Query::order_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// Single-column ordering
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Selection criteria: equality filters joined by AND, plus an optional order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, FieldValue)>,
    order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only records whose `column` equals `value`
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn filters(&self) -> &[(String, FieldValue)] {
        &self.filters
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Reject columns `R` does not declare
    pub fn validate<R: Record>(&self) -> StoreResult<()> {
        let named = self
            .filters
            .iter()
            .map(|(column, _)| column.as_str())
            .chain(self.order.iter().map(|order| order.column.as_str()));

        for column in named {
            if !R::COLUMNS.contains(&column) {
                return Err(StoreError::unknown_column(R::TABLE, column));
            }
        }

        Ok(())
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.filters
            .iter()
            .all(|(column, value)| record.column(column).as_ref() == Some(value))
    }
}

/// Storage for records of one type
#[async_trait]
pub trait Table<R: Record>: Send + Sync {
    /// Store a new record; fails with `DuplicateKey` when its key is taken
    async fn insert(&self, record: R) -> StoreResult<R>;

    /// Every record matching `query`, in its order; unordered results keep
    /// insertion order on the memory backend only
    async fn select_all(&self, query: &Query) -> StoreResult<Vec<R>>;

    async fn select_by_key(&self, key: &R::Key) -> StoreResult<R>;

    /// Replace every mutable field of the record under `key`
    async fn update(&self, key: &R::Key, fields: R::Fields) -> StoreResult<R>;

    async fn delete(&self, key: &R::Key) -> StoreResult<()>;
}

/// Shared handle to a table, whatever the backend
pub type SharedTable<R> = Arc<dyn Table<R>>;

/// Store backend, constructed once at startup and handed to repositories
#[derive(Clone, Debug)]
pub enum Store {
    Memory,
    Postgres(PgPool),
}

impl Store {
    /// Open a table for `R` on this backend
    pub fn table<R>(&self) -> SharedTable<R>
    where
        R: Record + for<'r> FromRow<'r, PgRow> + Unpin,
    {
        match self {
            Store::Memory => Arc::new(MemoryTable::<R>::new()),
            Store::Postgres(pool) => Arc::new(PgTable::<R>::new(pool.clone())),
        }
    }

    /// Check the backend is reachable
    pub async fn health_check(&self) -> bool {
        match self {
            Store::Memory => true,
            Store::Postgres(pool) => crate::database::health_check(pool).await.is_ok(),
        }
    }

    /// Release backend resources
    pub async fn close(&self) {
        if let Store::Postgres(pool) = self {
            info!("Closing database connection pool");
            pool.close().await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal record used by the backend tests
    #[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
    pub struct Room {
        pub id: String,
        pub kind: String,
        pub price: f64,
    }

    impl Record for Room {
        type Key = String;
        type Fields = (String, f64);

        const TABLE: &'static str = "rooms";
        const KEY_COLUMN: &'static str = "id";
        const COLUMNS: &'static [&'static str] = &["id", "kind", "price"];

        fn key(&self) -> &String {
            &self.id
        }

        fn column(&self, column: &str) -> Option<FieldValue> {
            match column {
                "id" => Some(self.id.clone().into()),
                "kind" => Some(self.kind.clone().into()),
                "price" => Some(self.price.into()),
                _ => None,
            }
        }

        fn replace_fields(&mut self, (kind, price): Self::Fields) {
            self.kind = kind;
            self.price = price;
        }
    }

    pub fn room(id: &str, kind: &str, price: f64) -> Room {
        Room {
            id: id.to_string(),
            kind: kind.to_string(),
            price,
        }
    }

    #[test]
    fn test_validate_rejects_unknown_columns() {
        let query = Query::new().eq("colour", "red");
        assert_eq!(
            query.validate::<Room>(),
            Err(StoreError::unknown_column("rooms", "colour"))
        );

        let query = Query::new().order_by("size", Direction::Ascending);
        assert!(query.validate::<Room>().is_err());

        let query = Query::new()
            .eq("kind", "suite")
            .order_by("price", Direction::Descending);
        assert!(query.validate::<Room>().is_ok());
    }

    #[test]
    fn test_matches_requires_every_filter() {
        let suite = room("R1", "suite", 200.0);
        assert!(Query::new().matches(&suite));
        assert!(Query::new().eq("kind", "suite").matches(&suite));
        assert!(!Query::new().eq("kind", "suite").eq("id", "R2").matches(&suite));
        assert!(!Query::new().eq("price", "200").matches(&suite));
    }

    #[test]
    fn test_total_cmp_orders_numbers_and_puts_nulls_last() {
        let low = FieldValue::Number(50.0);
        let high = FieldValue::Number(200.0);
        assert_eq!(low.total_cmp(&high), Ordering::Less);
        assert_eq!(FieldValue::Null.total_cmp(&low), Ordering::Greater);
        assert_eq!(
            FieldValue::from(None::<String>).total_cmp(&FieldValue::Null),
            Ordering::Equal
        );
    }
}
