//! Bulk ingestion trait and summary type.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::ItemBatch;

/// Summary of a successful bulk ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkSummary {
    /// Number of items written.
    pub count: usize,
}

impl BulkSummary {
    /// Creates a summary for `count` written items.
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl std::fmt::Display for BulkSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Successfully added {} items.", self.count)
    }
}

/// Validated, all-or-nothing ingestion of item batches.
#[async_trait]
pub trait BulkTransactions: Send + Sync {
    /// Validates every item of `batch` in submission order, then writes all of
    /// them in one engine request.
    ///
    /// The first item failing validation aborts the call before anything is
    /// written.
    async fn bulk_item_insert(
        &self,
        batch: ItemBatch,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<BulkSummary>;
}
