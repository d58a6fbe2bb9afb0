//! Signature store: create and list-all over a single remote table.
//!
//! DESIGN
//! ======
//! `SignatureStore` holds an explicitly constructed [`RemoteTable`] handle and
//! nothing else: no cache, no optimistic update. Callers re-list after every
//! successful create. Remote failures arrive already classified as
//! [`StoreError`] so the submission boundary can map them to fixed copy.
//!
//! The hosted backend is [`postgrest::PostgrestTable`]; [`memory::MemoryTable`]
//! mirrors its uniqueness and required-field behavior in process.

pub mod memory;
pub mod postgrest;
pub mod types;

use std::sync::Arc;

use tracing::{info, warn};

use crate::validate::ValidSignature;
pub use types::{NewSignature, SignatureId, SignatureRecord, StoreError};

/// Column the collection is ordered by.
pub const ORDER_COLUMN: &str = "created_at";

// =============================================================================
// REMOTE SEAM
// =============================================================================

/// Generic query interface over the signatures table.
#[async_trait::async_trait]
pub trait RemoteTable: Send + Sync {
    /// Select every row, ordered by `order_column` descending.
    async fn select_all_desc(&self, order_column: &str) -> Result<Vec<SignatureRecord>, StoreError>;

    /// Insert one row. Returns the inserted row when the backend echoes it.
    async fn insert(&self, row: &NewSignature) -> Result<Option<SignatureRecord>, StoreError>;
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Clone)]
pub struct SignatureStore {
    table: Arc<dyn RemoteTable>,
}

impl SignatureStore {
    #[must_use]
    pub fn new(table: Arc<dyn RemoteTable>) -> Self {
        Self { table }
    }

    /// Fetch the full collection, newest first.
    ///
    /// # Errors
    ///
    /// Propagates the classified remote failure; callers render an empty
    /// state with generic copy instead of the error text.
    pub async fn list(&self) -> Result<Vec<SignatureRecord>, StoreError> {
        let mut records = self.table.select_all_desc(ORDER_COLUMN).await.inspect_err(|e| {
            warn!(error = %e, "signature list failed");
        })?;
        types::sort_newest_first(&mut records);
        Ok(records)
    }

    /// Persist a validated signature.
    ///
    /// # Errors
    ///
    /// Returns the classified remote failure (duplicate, required field,
    /// permission, connectivity or unknown).
    pub async fn create(&self, signature: &ValidSignature) -> Result<Option<SignatureRecord>, StoreError> {
        info!(
            display_name = signature.display_name(),
            preview = %preview(signature.message()),
            "adding signature"
        );

        let row = NewSignature::from(signature);
        match self.table.insert(&row).await {
            Ok(created) => {
                info!(id = created.as_ref().map(|r| r.id.as_str()), "signature added");
                Ok(created)
            }
            Err(e) => {
                warn!(error = %e, "signature insert failed");
                Err(e)
            }
        }
    }
}

/// First 20 characters of a message, for logs.
fn preview(message: &str) -> String {
    let mut out: String = message.chars().take(20).collect();
    if message.chars().count() > 20 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
