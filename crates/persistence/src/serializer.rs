//! Conversion between wire resources and stored documents.
//!
//! The stored form differs from the wire form only in its links: server links
//! are dropped on the way in and regenerated for the caller's base URL on the
//! way out. Items additionally carry `created`/`updated` timestamps.

use chrono::Utc;
use serde_json::Value;

use crate::error::{StorageResult, ValidationError};
use crate::links::{self, CollectionLinks, ItemLinks};
use crate::types::{Collection, Document, Item};

/// Converts a resource to and from its stored document.
pub trait Serializer {
    /// The wire resource type.
    type Resource;

    /// Builds the document to store for `resource`.
    fn to_storage(resource: &Self::Resource, base_url: &str) -> StorageResult<Document>;

    /// Rebuilds the wire resource from a stored document.
    fn to_wire(document: Document, base_url: &str) -> StorageResult<Self::Resource>;
}

/// Current UTC time as ISO-8601 with second precision, e.g. `2024-05-01T12:00:00Z`.
pub fn now_to_rfc3339_str() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn malformed(kind: &str, err: impl std::fmt::Display) -> crate::error::StorageError {
    ValidationError::InvalidResource {
        message: format!("stored {} document is malformed: {}", kind, err),
    }
    .into()
}

/// Item serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemSerializer;

impl ItemSerializer {
    /// Sets `properties.updated` to now.
    pub fn stamp_updated(item: &mut Item) {
        item.properties
            .insert("updated".to_string(), Value::String(now_to_rfc3339_str()));
    }

    /// Sets `properties.created` to now unless already present.
    pub fn stamp_created(item: &mut Item) {
        item.properties
            .entry("created")
            .or_insert_with(|| Value::String(now_to_rfc3339_str()));
    }
}

impl Serializer for ItemSerializer {
    type Resource = Item;

    fn to_storage(item: &Item, base_url: &str) -> StorageResult<Document> {
        let mut stored = item.clone();
        stored.links.retain(|l| !links::is_server_link(l));
        links::relativize_links(&mut stored.links, base_url);
        Self::stamp_created(&mut stored);
        stored.to_value()
    }

    fn to_wire(document: Document, base_url: &str) -> StorageResult<Item> {
        let mut item: Item =
            serde_json::from_value(document).map_err(|e| malformed("item", e))?;

        let generated = ItemLinks::new(item.collection_id(), &item.id, base_url).create_links();
        let stored = std::mem::take(&mut item.links);
        item.links = links::merge_links(generated, stored, base_url);
        Ok(item)
    }
}

/// Collection serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionSerializer;

impl Serializer for CollectionSerializer {
    type Resource = Collection;

    fn to_storage(collection: &Collection, base_url: &str) -> StorageResult<Document> {
        let mut stored = collection.clone();
        stored.links.retain(|l| !links::is_server_link(l));
        links::relativize_links(&mut stored.links, base_url);
        stored.to_value()
    }

    fn to_wire(document: Document, base_url: &str) -> StorageResult<Collection> {
        let mut collection: Collection =
            serde_json::from_value(document).map_err(|e| malformed("collection", e))?;

        let generated = CollectionLinks::new(&collection.id, base_url).create_links();
        let stored = std::mem::take(&mut collection.links);
        collection.links = links::merge_links(generated, stored, base_url);
        Ok(collection)
    }
}
