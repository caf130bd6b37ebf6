//! In-process table backend

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Direction, Query, Record, Table};
use crate::error::{StoreError, StoreResult};

struct Rows<R: Record> {
    /// Records keyed by insertion sequence
    by_seq: BTreeMap<u64, R>,
    /// Key to insertion sequence
    index: HashMap<R::Key, u64>,
    next_seq: u64,
}

/// Table held in memory behind a single async read/write lock
///
/// Every operation takes the lock once, so each insert, update or delete is
/// atomic with respect to every other operation on the table.
pub struct MemoryTable<R: Record> {
    rows: RwLock<Rows<R>>,
}

impl<R: Record> MemoryTable<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Rows {
                by_seq: BTreeMap::new(),
                index: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.rows.read().await.index.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<R: Record> Default for MemoryTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> Table<R> for MemoryTable<R> {
    async fn insert(&self, record: R) -> StoreResult<R> {
        let mut rows = self.rows.write().await;
        if rows.index.contains_key(record.key()) {
            return Err(StoreError::duplicate_key(R::TABLE, record.key()));
        }

        let seq = rows.next_seq;
        rows.next_seq += 1;
        rows.index.insert(record.key().clone(), seq);
        rows.by_seq.insert(seq, record.clone());

        Ok(record)
    }

    async fn select_all(&self, query: &Query) -> StoreResult<Vec<R>> {
        query.validate::<R>()?;

        let rows = self.rows.read().await;
        let mut selected: Vec<R> = rows
            .by_seq
            .values()
            .filter(|record| query.matches(*record))
            .cloned()
            .collect();
        drop(rows);

        if let Some(order) = query.order() {
            // sort_by is stable, so ties keep insertion order
            selected.sort_by(|a, b| {
                let (a, b) = (a.column(&order.column), b.column(&order.column));
                let ordering = match (a, b) {
                    (Some(a), Some(b)) => a.total_cmp(&b),
                    _ => std::cmp::Ordering::Equal,
                };
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        Ok(selected)
    }

    async fn select_by_key(&self, key: &R::Key) -> StoreResult<R> {
        let rows = self.rows.read().await;
        rows.index
            .get(key)
            .and_then(|seq| rows.by_seq.get(seq))
            .cloned()
            .ok_or_else(|| StoreError::not_found(R::TABLE, key))
    }

    async fn update(&self, key: &R::Key, fields: R::Fields) -> StoreResult<R> {
        let mut rows = self.rows.write().await;
        let seq = *rows
            .index
            .get(key)
            .ok_or_else(|| StoreError::not_found(R::TABLE, key))?;
        let record = rows
            .by_seq
            .get_mut(&seq)
            .ok_or_else(|| StoreError::not_found(R::TABLE, key))?;

        record.replace_fields(fields);
        Ok(record.clone())
    }

    async fn delete(&self, key: &R::Key) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        let seq = rows
            .index
            .remove(key)
            .ok_or_else(|| StoreError::not_found(R::TABLE, key))?;
        rows.by_seq.remove(&seq);
        Ok(())
    }
}
