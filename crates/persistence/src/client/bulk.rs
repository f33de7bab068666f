//! Validated bulk ingestion of items.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::CatalogConfig;
use crate::core::{BulkAction, BulkSummary, BulkTransactions, DocumentEngine};
use crate::error::{ResourceKind, StorageError, StorageResult};
use crate::mapping::{ensure_index, items_mapping};
use crate::serializer::{ItemSerializer, Serializer};
use crate::types::ItemBatch;

use super::guard::ConsistencyGuard;

/// Ingests item batches in a single engine request.
///
/// Every item is validated before anything is written, so a rejected batch
/// leaves the catalog untouched. Failures the engine reports for individual
/// actions are not reconciled.
#[derive(Debug)]
pub struct BulkTransactionClient<E: ?Sized> {
    engine: Arc<E>,
    config: Arc<CatalogConfig>,
    guard: ConsistencyGuard<E>,
}

impl<E: DocumentEngine + ?Sized> BulkTransactionClient<E> {
    /// Creates a bulk client over a shared engine handle.
    pub fn new(engine: Arc<E>, config: Arc<CatalogConfig>) -> Self {
        let guard = ConsistencyGuard::new(Arc::clone(&engine), Arc::clone(&config));
        Self {
            engine,
            config,
            guard,
        }
    }

    /// Validates `batch` in submission order and builds one create action per
    /// item.
    async fn prepare(&self, batch: &ItemBatch, base_url: &str) -> StorageResult<Vec<BulkAction>> {
        let mut seen = HashSet::with_capacity(batch.len());
        let mut actions = Vec::with_capacity(batch.len());

        for item in batch.iter() {
            if !seen.insert(item.id.as_str()) {
                warn!("Rejected batch: item '{}' appears more than once", item.id);
                return Err(StorageError::already_exists(ResourceKind::Item, &item.id));
            }

            self.guard.check_create_item(item).await?;
            let document = ItemSerializer::to_storage(item, base_url)?;
            actions.push(BulkAction::create(
                self.config.items_index.as_str(),
                item.id.as_str(),
                document,
            ));
        }

        Ok(actions)
    }
}

#[async_trait]
impl<E: DocumentEngine + ?Sized> BulkTransactions for BulkTransactionClient<E> {
    async fn bulk_item_insert(
        &self,
        batch: ItemBatch,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<BulkSummary> {
        ensure_index(self.engine.as_ref(), &self.config.items_index, items_mapping()).await?;

        if batch.is_empty() {
            return Ok(BulkSummary::new(0));
        }

        let actions = self.prepare(&batch, base_url).await?;
        let response = self.engine.bulk(actions, refresh).await?;
        let count = response.into_result(self.engine.name())?;

        debug!(
            "Bulk inserted {} items into '{}'",
            count, self.config.items_index
        );
        Ok(BulkSummary::new(count))
    }
}
