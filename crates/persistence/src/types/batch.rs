//! Item batches and create-item payloads.

use serde_json::Value;

use crate::error::{StorageResult, ValidationError};

use super::resource::Item;

/// An ordered group of items submitted together for bulk ingestion.
///
/// A batch only lives for the duration of one ingest call. Iteration order is
/// submission order, which is also the order in which items are validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemBatch {
    items: Vec<Item>,
}

impl ItemBatch {
    /// Creates a batch from items in submission order.
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Parses a batch from either a GeoJSON `FeatureCollection` (`features`
    /// array) or a bulk-transactions body (`items` object keyed by item id).
    pub fn from_value(value: Value) -> StorageResult<Self> {
        let Value::Object(mut body) = value else {
            return Err(invalid("item batch must be a JSON object"));
        };

        let entries: Vec<Value> = if let Some(features) = body.remove("features") {
            match features {
                Value::Array(features) => features,
                _ => return Err(invalid("'features' must be an array")),
            }
        } else if let Some(items) = body.remove("items") {
            match items {
                Value::Object(items) => items.into_iter().map(|(_, item)| item).collect(),
                Value::Array(items) => items,
                _ => return Err(invalid("'items' must be an object or an array")),
            }
        } else {
            return Err(invalid("item batch needs a 'features' or 'items' member"));
        };

        let items = entries
            .into_iter()
            .map(Item::from_value)
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Self { items })
    }

    /// Number of items in the batch.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the batch holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates the items in submission order.
    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }
}

impl From<Vec<Item>> for ItemBatch {
    fn from(items: Vec<Item>) -> Self {
        Self::new(items)
    }
}

impl FromIterator<Item> for ItemBatch {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for ItemBatch {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// The body of a create-item call.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPayload {
    /// A single `Feature`.
    Item(Item),
    /// A `FeatureCollection`, ingested through the bulk path.
    Batch(ItemBatch),
}

impl ItemPayload {
    /// Interprets a JSON body by its `type` member.
    pub fn from_value(value: Value) -> StorageResult<Self> {
        match value.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => Ok(ItemPayload::Batch(ItemBatch::from_value(value)?)),
            _ => Ok(ItemPayload::Item(Item::from_value(value)?)),
        }
    }
}

impl From<Item> for ItemPayload {
    fn from(item: Item) -> Self {
        ItemPayload::Item(item)
    }
}

impl From<ItemBatch> for ItemPayload {
    fn from(batch: ItemBatch) -> Self {
        ItemPayload::Batch(batch)
    }
}

fn invalid(message: &str) -> crate::error::StorageError {
    ValidationError::InvalidResource {
        message: message.to_string(),
    }
    .into()
}
