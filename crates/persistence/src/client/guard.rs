//! Referential and uniqueness checks run before each write.
//!
//! Every check is a point read against the engine immediately before the write
//! it protects. Two writers can both pass a check; the create-only write that
//! follows lets exactly one of them win.

use std::sync::Arc;

use tracing::warn;

use crate::config::CatalogConfig;
use crate::core::DocumentEngine;
use crate::error::{ResourceKind, StorageError, StorageResult};
use crate::types::{Collection, Document, Item};

/// Pre-write consistency checks.
#[derive(Debug)]
pub struct ConsistencyGuard<E: ?Sized> {
    engine: Arc<E>,
    config: Arc<CatalogConfig>,
}

impl<E: ?Sized> Clone for ConsistencyGuard<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            config: Arc::clone(&self.config),
        }
    }
}

impl<E: DocumentEngine + ?Sized> ConsistencyGuard<E> {
    /// Creates a guard reading from `engine`.
    pub fn new(engine: Arc<E>, config: Arc<CatalogConfig>) -> Self {
        Self { engine, config }
    }

    /// The item must reference an existing collection and its id must be free.
    pub async fn check_create_item(&self, item: &Item) -> StorageResult<()> {
        self.check_collection_reference(item.collection_id()).await?;

        if self.engine.exists(&self.config.items_index, &item.id).await? {
            warn!(
                "Rejected item '{}': id already exists in '{}'",
                item.id, self.config.items_index
            );
            return Err(StorageError::already_exists(ResourceKind::Item, &item.id));
        }
        Ok(())
    }

    /// The collection id must be free.
    pub async fn check_create_collection(&self, collection: &Collection) -> StorageResult<()> {
        if self
            .engine
            .exists(&self.config.collections_index, &collection.id)
            .await?
        {
            warn!("Rejected collection '{}': id already exists", collection.id);
            return Err(StorageError::already_exists(
                ResourceKind::Collection,
                &collection.id,
            ));
        }
        Ok(())
    }

    /// The item's collection must exist and the item must be stored in it.
    /// Returns the stored document.
    pub async fn check_update_item(&self, item: &Item) -> StorageResult<Document> {
        self.check_collection_reference(item.collection_id()).await?;
        self.check_existing_item(item.collection_id(), &item.id).await
    }

    /// Returns the stored collection document, or `NotFound`.
    pub async fn check_existing_collection(&self, collection_id: &str) -> StorageResult<Document> {
        match self
            .engine
            .get(&self.config.collections_index, collection_id)
            .await?
        {
            Some(document) => Ok(document),
            None => {
                warn!("Collection '{}' not found", collection_id);
                Err(StorageError::not_found(ResourceKind::Collection, collection_id))
            }
        }
    }

    /// Returns the stored item document, or `NotFound`.
    ///
    /// An item stored under a different collection is not found for this one.
    pub async fn check_existing_item(
        &self,
        collection_id: &str,
        item_id: &str,
    ) -> StorageResult<Document> {
        let stored = self.engine.get(&self.config.items_index, item_id).await?;

        match stored {
            Some(document)
                if document.get("collection").and_then(|c| c.as_str()) == Some(collection_id) =>
            {
                Ok(document)
            }
            Some(_) => {
                warn!(
                    "Item '{}' exists but not in collection '{}'",
                    item_id, collection_id
                );
                Err(StorageError::not_found(ResourceKind::Item, item_id))
            }
            None => {
                warn!("Item '{}' not found", item_id);
                Err(StorageError::not_found(ResourceKind::Item, item_id))
            }
        }
    }

    async fn check_collection_reference(&self, collection_id: &str) -> StorageResult<()> {
        if !self
            .engine
            .exists(&self.config.collections_index, collection_id)
            .await?
        {
            warn!("Rejected write: collection '{}' does not exist", collection_id);
            return Err(StorageError::foreign_key(collection_id));
        }
        Ok(())
    }
}
