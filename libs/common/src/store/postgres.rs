//! PostgreSQL table backend
//!
//! Statements are assembled from the record's declared columns and every
//! value is bound as a parameter. Column names never come from request data:
//! queries are checked against [`Record::COLUMNS`] before any SQL is built.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{
    FromRow, PgPool, Postgres,
    postgres::{PgArguments, PgRow},
    query::QueryAs,
};
use tracing::error;

use super::{FieldValue, Query, Record, Table};
use crate::error::{StoreError, StoreResult};

type PgQueryAs<'q, R> = QueryAs<'q, Postgres, R, PgArguments>;

fn bind<'q, R>(query: PgQueryAs<'q, R>, value: FieldValue) -> PgQueryAs<'q, R> {
    match value {
        FieldValue::Text(text) => query.bind(text),
        FieldValue::Number(number) => query.bind(number),
        FieldValue::Uuid(uuid) => query.bind(uuid),
        FieldValue::Date(date) => query.bind(date),
        FieldValue::Timestamp(timestamp) => query.bind(timestamp),
        FieldValue::Null => query.bind(None::<String>),
    }
}

fn column_list<R: Record>() -> String {
    R::COLUMNS.join(", ")
}

fn mutable_columns<R: Record>() -> impl Iterator<Item = &'static str> {
    R::COLUMNS
        .iter()
        .copied()
        .filter(|column| *column != R::KEY_COLUMN)
}

/// `SELECT` for `query`; parameters are the filter values in order
pub fn select_sql<R: Record>(query: &Query) -> StoreResult<String> {
    query.validate::<R>()?;

    let mut sql = format!("SELECT {} FROM {}", column_list::<R>(), R::TABLE);

    let conditions: Vec<String> = query
        .filters()
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ${}", column, i + 1))
        .collect();
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if let Some(order) = query.order() {
        sql.push_str(&format!(
            " ORDER BY {} {}",
            order.column,
            order.direction.as_sql()
        ));
    }

    Ok(sql)
}

/// `SELECT … WHERE key = $1`, optionally locking the row
pub fn select_by_key_sql<R: Record>(for_update: bool) -> String {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    format!(
        "SELECT {} FROM {} WHERE {} = $1{}",
        column_list::<R>(),
        R::TABLE,
        R::KEY_COLUMN,
        lock
    )
}

/// `INSERT` of every column, in declaration order
pub fn insert_sql<R: Record>() -> String {
    let placeholders: Vec<String> = (1..=R::COLUMNS.len()).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        R::TABLE,
        column_list::<R>(),
        placeholders.join(", "),
        column_list::<R>()
    )
}

/// `UPDATE` of every mutable column; the key is the last parameter
pub fn update_sql<R: Record>() -> String {
    let assignments: Vec<String> = mutable_columns::<R>()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}", column, i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        R::TABLE,
        assignments.join(", "),
        R::KEY_COLUMN,
        assignments.len() + 1,
        column_list::<R>()
    )
}

pub fn delete_sql<R: Record>() -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1 RETURNING {}",
        R::TABLE,
        R::KEY_COLUMN,
        column_list::<R>()
    )
}

/// Table stored in PostgreSQL
pub struct PgTable<R> {
    pool: PgPool,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> PgTable<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

fn store_error<R: Record>(key: impl ToString, err: sqlx::Error) -> StoreError {
    let mapped = StoreError::from_sqlx(R::TABLE, key, err);
    if let StoreError::Unavailable(reason) = &mapped {
        error!("Query on {} failed: {}", R::TABLE, reason);
    }
    mapped
}

#[async_trait]
impl<R> Table<R> for PgTable<R>
where
    R: Record + for<'r> FromRow<'r, PgRow> + Unpin,
{
    async fn insert(&self, record: R) -> StoreResult<R> {
        let sql = insert_sql::<R>();
        let mut query = sqlx::query_as::<_, R>(&sql);
        for column in R::COLUMNS {
            query = bind(query, record.column(column).unwrap_or(FieldValue::Null));
        }

        query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error::<R>(record.key(), e))
    }

    async fn select_all(&self, query: &Query) -> StoreResult<Vec<R>> {
        let sql = select_sql::<R>(query)?;
        let mut statement = sqlx::query_as::<_, R>(&sql);
        for (_, value) in query.filters() {
            statement = bind(statement, value.clone());
        }

        statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error::<R>("*", e))
    }

    async fn select_by_key(&self, key: &R::Key) -> StoreResult<R> {
        let sql = select_by_key_sql::<R>(false);
        bind(sqlx::query_as::<_, R>(&sql), key.clone().into())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error::<R>(key, e))?
            .ok_or_else(|| StoreError::not_found(R::TABLE, key))
    }

    async fn update(&self, key: &R::Key, fields: R::Fields) -> StoreResult<R> {
        let mut tx = self.pool.begin().await.map_err(|e| store_error::<R>(key, e))?;

        let sql = select_by_key_sql::<R>(true);
        let mut record = bind(sqlx::query_as::<_, R>(&sql), key.clone().into())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| store_error::<R>(key, e))?
            .ok_or_else(|| StoreError::not_found(R::TABLE, key))?;
        record.replace_fields(fields);

        let sql = update_sql::<R>();
        let mut statement = sqlx::query_as::<_, R>(&sql);
        for column in mutable_columns::<R>() {
            statement = bind(statement, record.column(column).unwrap_or(FieldValue::Null));
        }
        let updated = bind(statement, key.clone().into())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| store_error::<R>(key, e))?;

        tx.commit().await.map_err(|e| store_error::<R>(key, e))?;
        Ok(updated)
    }

    async fn delete(&self, key: &R::Key) -> StoreResult<()> {
        let sql = delete_sql::<R>();
        bind(sqlx::query_as::<_, R>(&sql), key.clone().into())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error::<R>(key, e))?
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(R::TABLE, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Direction, tests::Room};

    #[test]
    fn test_select_sql_without_criteria() {
        let sql = select_sql::<Room>(&Query::new()).unwrap();
        assert_eq!(sql, "SELECT id, kind, price FROM rooms");
    }

    #[test]
    fn test_select_sql_with_filters_and_order() {
        let query = Query::new()
            .eq("kind", "suite")
            .eq("id", "R1")
            .order_by("price", Direction::Descending);
        let sql = select_sql::<Room>(&query).unwrap();
        assert_eq!(
            sql,
            "SELECT id, kind, price FROM rooms WHERE kind = $1 AND id = $2 ORDER BY price DESC"
        );
    }

    #[test]
    fn test_select_sql_rejects_injected_column() {
        let query = Query::new().order_by("price; DROP TABLE rooms", Direction::Ascending);
        assert!(matches!(
            select_sql::<Room>(&query),
            Err(StoreError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_select_by_key_sql_locks_when_asked() {
        assert_eq!(
            select_by_key_sql::<Room>(false),
            "SELECT id, kind, price FROM rooms WHERE id = $1"
        );
        assert_eq!(
            select_by_key_sql::<Room>(true),
            "SELECT id, kind, price FROM rooms WHERE id = $1 FOR UPDATE"
        );
    }

    #[test]
    fn test_insert_sql_binds_every_column() {
        assert_eq!(
            insert_sql::<Room>(),
            "INSERT INTO rooms (id, kind, price) VALUES ($1, $2, $3) RETURNING id, kind, price"
        );
    }

    #[test]
    fn test_update_sql_skips_key_column() {
        assert_eq!(
            update_sql::<Room>(),
            "UPDATE rooms SET kind = $1, price = $2 WHERE id = $3 RETURNING id, kind, price"
        );
    }

    #[test]
    fn test_delete_sql_returns_deleted_row() {
        assert_eq!(
            delete_sql::<Room>(),
            "DELETE FROM rooms WHERE id = $1 RETURNING id, kind, price"
        );
    }
}
