//! In-process signatures table.
//!
//! Enforces the same constraints as the hosted table: non-empty columns and
//! uniqueness on (`display_name`, `message`). Timestamps are strictly
//! increasing so insertion order and `created_at` order always agree.

use std::sync::Mutex;

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{NewSignature, RemoteTable, SignatureId, SignatureRecord, StoreError, ORDER_COLUMN};

#[derive(Default)]
pub struct MemoryTable {
    rows: Mutex<Vec<SignatureRecord>>,
}

impl MemoryTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryTable {
    /// Seed the table with existing rows.
    #[must_use]
    pub fn with_records(records: Vec<SignatureRecord>) -> Self {
        Self { rows: Mutex::new(records) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl RemoteTable for MemoryTable {
    async fn select_all_desc(&self, order_column: &str) -> Result<Vec<SignatureRecord>, StoreError> {
        if order_column != ORDER_COLUMN {
            return Err(StoreError::Unknown(format!("column signatures.{order_column} does not exist")));
        }
        let mut rows = self
            .rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        rows.reverse();
        super::types::sort_newest_first(&mut rows);
        Ok(rows)
    }

    async fn insert(&self, row: &NewSignature) -> Result<Option<SignatureRecord>, StoreError> {
        if row.display_name.is_empty() || row.message.is_empty() {
            return Err(StoreError::RequiredField);
        }

        let mut rows = self
            .rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if rows
            .iter()
            .any(|r| r.display_name == row.display_name && r.message == row.message)
        {
            return Err(StoreError::Duplicate);
        }

        let now = OffsetDateTime::now_utc();
        let created_at = match rows.iter().map(|r| r.created_at).max() {
            Some(latest) if latest >= now => latest + Duration::microseconds(1),
            _ => now,
        };

        let record = SignatureRecord {
            id: SignatureId::new(Uuid::new_v4().to_string()),
            display_name: row.display_name.clone(),
            message: row.message.clone(),
            created_at,
        };
        rows.push(record.clone());
        Ok(Some(record))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
