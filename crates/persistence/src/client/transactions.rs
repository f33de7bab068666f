//! Single-resource transactions against a document engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{CatalogConfig, UpdateStrategy};
use crate::core::{
    BulkTransactions, CatalogReader, CatalogTransactions, CreateItemOutcome, DocumentEngine,
    PatchDocument, WriteMode,
};
use crate::error::{BackendError, ResourceKind, StorageError, StorageResult};
use crate::mapping::{collections_mapping, ensure_index, items_mapping};
use crate::serializer::{CollectionSerializer, ItemSerializer, Serializer};
use crate::types::{Collection, Item, ItemPayload};

use super::bind_to_collection;
use super::bulk::BulkTransactionClient;
use super::guard::ConsistencyGuard;

/// Maps a create-only write conflict to a duplicate-resource error.
///
/// A conflict here means another writer created the same id between the
/// guard's check and this write.
fn conflict_as_duplicate(err: StorageError, kind: ResourceKind, id: &str) -> StorageError {
    match err {
        StorageError::Backend(BackendError::DocumentConflict { index, .. }) => {
            warn!("Create of {} '{}' lost a race in '{}'", kind, id, index);
            StorageError::already_exists(kind, id)
        }
        other => other,
    }
}

/// Transactional client for items and collections.
///
/// Holds a shared engine handle; cheap operations only, no background tasks.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use stac_persistence::backends::memory::MemoryEngine;
/// use stac_persistence::client::TransactionClient;
/// use stac_persistence::config::CatalogConfig;
/// use stac_persistence::core::CatalogTransactions;
/// use stac_persistence::types::Collection;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TransactionClient::new(Arc::new(MemoryEngine::new()), CatalogConfig::default());
/// let naip = client
///     .create_collection(Collection::new("naip"), "http://localhost:8080/", true)
///     .await?;
/// assert_eq!(naip.links[0].rel, "self");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TransactionClient<E: ?Sized> {
    engine: Arc<E>,
    config: Arc<CatalogConfig>,
    guard: ConsistencyGuard<E>,
    bulk: BulkTransactionClient<E>,
}

impl<E: DocumentEngine + ?Sized> TransactionClient<E> {
    /// Creates a client over a shared engine handle.
    pub fn new(engine: Arc<E>, config: CatalogConfig) -> Self {
        let config = Arc::new(config);
        Self {
            guard: ConsistencyGuard::new(Arc::clone(&engine), Arc::clone(&config)),
            bulk: BulkTransactionClient::new(Arc::clone(&engine), Arc::clone(&config)),
            engine,
            config,
        }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// The catalog configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// The bulk client sharing this client's engine.
    pub fn bulk_client(&self) -> &BulkTransactionClient<E> {
        &self.bulk
    }

    /// Creates both indices if they do not exist yet.
    pub async fn ensure_indices(&self) -> StorageResult<()> {
        ensure_index(
            self.engine.as_ref(),
            &self.config.collections_index,
            collections_mapping(),
        )
        .await?;
        ensure_index(self.engine.as_ref(), &self.config.items_index, items_mapping()).await
    }

    /// Guard, serialize and create-only write of a new item.
    async fn insert_item(&self, item: &Item, base_url: &str, refresh: bool) -> StorageResult<Item> {
        self.guard.check_create_item(item).await?;

        let document = ItemSerializer::to_storage(item, base_url)?;
        self.engine
            .index(
                &self.config.items_index,
                &item.id,
                document.clone(),
                WriteMode::Create,
                refresh,
            )
            .await
            .map_err(|e| conflict_as_duplicate(e, ResourceKind::Item, &item.id))?;

        debug!(
            "Created item '{}' in collection '{}'",
            item.id,
            item.collection_id()
        );
        ItemSerializer::to_wire(document, base_url)
    }

    /// Guard, serialize and create-only write of a new collection.
    async fn insert_collection(
        &self,
        collection: &Collection,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Collection> {
        self.guard.check_create_collection(collection).await?;

        let document = CollectionSerializer::to_storage(collection, base_url)?;
        self.engine
            .index(
                &self.config.collections_index,
                &collection.id,
                document.clone(),
                WriteMode::Create,
                refresh,
            )
            .await
            .map_err(|e| conflict_as_duplicate(e, ResourceKind::Collection, &collection.id))?;

        debug!("Created collection '{}'", collection.id);
        CollectionSerializer::to_wire(document, base_url)
    }
}

#[async_trait]
impl<E: DocumentEngine + ?Sized> CatalogTransactions for TransactionClient<E> {
    async fn create_item(
        &self,
        collection_id: &str,
        payload: ItemPayload,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<CreateItemOutcome> {
        match payload {
            ItemPayload::Batch(batch) => {
                let mut items = Vec::with_capacity(batch.len());
                for mut item in batch {
                    bind_to_collection(&mut item, collection_id)?;
                    items.push(item);
                }

                let summary = self
                    .bulk
                    .bulk_item_insert(items.into(), base_url, refresh)
                    .await?;
                Ok(CreateItemOutcome::Bulk(summary))
            }
            ItemPayload::Item(mut item) => {
                ensure_index(self.engine.as_ref(), &self.config.items_index, items_mapping())
                    .await?;
                bind_to_collection(&mut item, collection_id)?;

                let created = self.insert_item(&item, base_url, refresh).await?;
                Ok(CreateItemOutcome::Created(created))
            }
        }
    }

    async fn update_item(
        &self,
        collection_id: &str,
        item_id: &str,
        mut item: Item,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Item> {
        item.id = item_id.to_string();
        item.collection = Some(collection_id.to_string());
        ItemSerializer::stamp_updated(&mut item);

        let existing = self.guard.check_update_item(&item).await?;
        // A created timestamp sent in the body wins over the stored one.
        if let Some(created) = existing.pointer("/properties/created") {
            item.properties
                .entry("created")
                .or_insert_with(|| created.clone());
        }

        match self.config.update_strategy {
            UpdateStrategy::DeleteThenCreate => {
                self.engine
                    .delete(&self.config.items_index, item_id, refresh)
                    .await?;
                debug!("Deleted item '{}' for re-creation", item_id);
                self.insert_item(&item, base_url, refresh).await
            }
            UpdateStrategy::Replace => {
                let document = ItemSerializer::to_storage(&item, base_url)?;
                self.engine
                    .index(
                        &self.config.items_index,
                        item_id,
                        document.clone(),
                        WriteMode::Overwrite,
                        refresh,
                    )
                    .await?;
                debug!("Replaced item '{}'", item_id);
                ItemSerializer::to_wire(document, base_url)
            }
        }
    }

    async fn patch_item(
        &self,
        collection_id: &str,
        item_id: &str,
        patch: &PatchDocument,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Item> {
        let mut document = self.guard.check_existing_item(collection_id, item_id).await?;
        patch.apply(&mut document)?;

        if let Some(body) = document.as_object_mut() {
            body.insert("id".to_string(), Value::String(item_id.to_string()));
            body.insert(
                "collection".to_string(),
                Value::String(collection_id.to_string()),
            );
        }
        let item = Item::from_value(document)?;

        self.update_item(collection_id, item_id, item, base_url, refresh)
            .await
    }

    async fn delete_item(
        &self,
        collection_id: &str,
        item_id: &str,
        refresh: bool,
    ) -> StorageResult<()> {
        self.guard
            .check_existing_item(collection_id, item_id)
            .await?;

        if !self
            .engine
            .delete(&self.config.items_index, item_id, refresh)
            .await?
        {
            return Err(StorageError::not_found(ResourceKind::Item, item_id));
        }

        debug!("Deleted item '{}' from '{}'", item_id, collection_id);
        Ok(())
    }

    async fn create_collection(
        &self,
        collection: Collection,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Collection> {
        ensure_index(
            self.engine.as_ref(),
            &self.config.collections_index,
            collections_mapping(),
        )
        .await?;

        self.insert_collection(&collection, base_url, refresh).await
    }

    async fn update_collection(
        &self,
        collection_id: &str,
        mut collection: Collection,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Collection> {
        collection.id = collection_id.to_string();
        self.guard.check_existing_collection(collection_id).await?;

        match self.config.update_strategy {
            UpdateStrategy::DeleteThenCreate => {
                self.engine
                    .delete(&self.config.collections_index, collection_id, refresh)
                    .await?;
                debug!("Deleted collection '{}' for re-creation", collection_id);
                self.insert_collection(&collection, base_url, refresh).await
            }
            UpdateStrategy::Replace => {
                let document = CollectionSerializer::to_storage(&collection, base_url)?;
                self.engine
                    .index(
                        &self.config.collections_index,
                        collection_id,
                        document.clone(),
                        WriteMode::Overwrite,
                        refresh,
                    )
                    .await?;
                debug!("Replaced collection '{}'", collection_id);
                CollectionSerializer::to_wire(document, base_url)
            }
        }
    }

    async fn patch_collection(
        &self,
        collection_id: &str,
        patch: &PatchDocument,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Collection> {
        let mut document = self.guard.check_existing_collection(collection_id).await?;
        patch.apply(&mut document)?;

        if let Some(body) = document.as_object_mut() {
            body.insert("id".to_string(), Value::String(collection_id.to_string()));
        }
        let collection = Collection::from_value(document)?;

        self.update_collection(collection_id, collection, base_url, refresh)
            .await
    }

    async fn delete_collection(&self, collection_id: &str, refresh: bool) -> StorageResult<()> {
        self.guard.check_existing_collection(collection_id).await?;

        if !self
            .engine
            .delete(&self.config.collections_index, collection_id, refresh)
            .await?
        {
            return Err(StorageError::not_found(
                ResourceKind::Collection,
                collection_id,
            ));
        }

        debug!("Deleted collection '{}'", collection_id);
        Ok(())
    }
}

#[async_trait]
impl<E: DocumentEngine + ?Sized> CatalogReader for TransactionClient<E> {
    async fn get_item(
        &self,
        collection_id: &str,
        item_id: &str,
        base_url: &str,
    ) -> StorageResult<Item> {
        let document = self
            .guard
            .check_existing_item(collection_id, item_id)
            .await?;
        ItemSerializer::to_wire(document, base_url)
    }

    async fn get_collection(&self, collection_id: &str, base_url: &str) -> StorageResult<Collection> {
        let document = self.guard.check_existing_collection(collection_id).await?;
        CollectionSerializer::to_wire(document, base_url)
    }
}
