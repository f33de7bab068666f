//! Single-resource transaction traits.
//!
//! The catalog's write surface: create, update, patch and delete for items and
//! collections, plus the point reads callers use to observe the result. Every
//! mutating call carries a `base_url` used to materialize links in the returned
//! resource, and a `refresh` flag controlling immediate visibility.
//!
//! The engine has no multi-document transactions. Consistency is a policy of
//! the implementation: referential and uniqueness checks before each write,
//! create-only writes for new ids, and a configurable update strategy.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{StorageResult, ValidationError};
use crate::types::{Collection, Item, ItemPayload};

use super::bulk::BulkSummary;

/// Result of a create-item call.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateItemOutcome {
    /// A single item was created; its wire form is returned.
    Created(Item),
    /// A feature collection was ingested through the bulk path.
    Bulk(BulkSummary),
}

impl CreateItemOutcome {
    /// Returns the created item, if a single item was posted.
    pub fn into_item(self) -> Option<Item> {
        match self {
            CreateItemOutcome::Created(item) => Some(item),
            CreateItemOutcome::Bulk(_) => None,
        }
    }
}

/// Media type of an RFC 7396 merge patch.
pub const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";

/// Media type of an RFC 6902 JSON patch.
pub const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// A partial update to a stored resource.
#[derive(Debug, Clone)]
pub enum PatchDocument {
    /// RFC 7396 merge patch: objects merge, `null` removes a member.
    Merge(Value),
    /// RFC 6902 JSON patch: an ordered list of operations.
    Json(json_patch::Patch),
}

impl PatchDocument {
    /// Parses a patch body according to its media type.
    ///
    /// Plain `application/json` bodies are treated as merge patches when they
    /// are objects and as JSON patches when they are arrays.
    pub fn from_content_type(content_type: &str, body: Value) -> StorageResult<Self> {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match media_type.as_str() {
            MERGE_PATCH_CONTENT_TYPE => Ok(PatchDocument::Merge(body)),
            JSON_PATCH_CONTENT_TYPE => Self::json(body),
            "application/json" if body.is_array() => Self::json(body),
            "application/json" => Ok(PatchDocument::Merge(body)),
            other => Err(ValidationError::InvalidPatch {
                message: format!("unsupported patch media type: {}", other),
            }
            .into()),
        }
    }

    /// Parses an RFC 6902 operation list.
    pub fn json(body: Value) -> StorageResult<Self> {
        let patch: json_patch::Patch =
            serde_json::from_value(body).map_err(|e| ValidationError::InvalidPatch {
                message: format!("invalid JSON Patch document: {}", e),
            })?;
        Ok(PatchDocument::Json(patch))
    }

    /// Applies the patch to `target` in place.
    pub fn apply(&self, target: &mut Value) -> StorageResult<()> {
        match self {
            PatchDocument::Merge(merge_doc) => {
                json_patch::merge(target, merge_doc);
                Ok(())
            }
            PatchDocument::Json(patch) => {
                json_patch::patch(target, patch)?;
                Ok(())
            }
        }
    }
}

/// Create, update, patch and delete of catalog resources.
#[async_trait]
pub trait CatalogTransactions: Send + Sync {
    /// Creates an item, or ingests a feature collection in bulk.
    ///
    /// `collection_id` is the owning collection from the request path; items
    /// that do not name a collection are assigned to it.
    ///
    /// # Errors
    ///
    /// * `ResourceError::ForeignKeyViolation` - the collection does not exist
    /// * `ResourceError::AlreadyExists` - an item with the same id exists
    /// * `ValidationError::CollectionMismatch` - body and path disagree
    async fn create_item(
        &self,
        collection_id: &str,
        payload: ItemPayload,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<CreateItemOutcome>;

    /// Replaces an existing item. Path identifiers win over the body.
    ///
    /// # Errors
    ///
    /// * `ResourceError::ForeignKeyViolation` - the collection does not exist
    /// * `ResourceError::NotFound` - the item does not exist
    async fn update_item(
        &self,
        collection_id: &str,
        item_id: &str,
        item: Item,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Item>;

    /// Applies a patch to an existing item and stores the result.
    async fn patch_item(
        &self,
        collection_id: &str,
        item_id: &str,
        patch: &PatchDocument,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Item>;

    /// Deletes an item.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - no such item in this collection
    async fn delete_item(&self, collection_id: &str, item_id: &str, refresh: bool)
    -> StorageResult<()>;

    /// Creates a collection.
    ///
    /// # Errors
    ///
    /// * `ResourceError::AlreadyExists` - a collection with the same id exists
    async fn create_collection(
        &self,
        collection: Collection,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Collection>;

    /// Replaces an existing collection. The path identifier wins over the body.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - the collection does not exist
    async fn update_collection(
        &self,
        collection_id: &str,
        collection: Collection,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Collection>;

    /// Applies a patch to an existing collection and stores the result.
    async fn patch_collection(
        &self,
        collection_id: &str,
        patch: &PatchDocument,
        base_url: &str,
        refresh: bool,
    ) -> StorageResult<Collection>;

    /// Deletes a collection. Items of the collection are left in place.
    ///
    /// # Errors
    ///
    /// * `ResourceError::NotFound` - the collection does not exist
    async fn delete_collection(&self, collection_id: &str, refresh: bool) -> StorageResult<()>;
}

/// Point reads of catalog resources.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Reads one item of a collection.
    async fn get_item(
        &self,
        collection_id: &str,
        item_id: &str,
        base_url: &str,
    ) -> StorageResult<Item>;

    /// Reads one collection.
    async fn get_collection(&self, collection_id: &str, base_url: &str)
    -> StorageResult<Collection>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use serde_json::json;

    #[test]
    fn test_merge_patch_removes_null_members() {
        let mut target = json!({"properties": {"gsd": 1.0, "cloud_cover": 10}});
        let patch = PatchDocument::from_content_type(
            MERGE_PATCH_CONTENT_TYPE,
            json!({"properties": {"cloud_cover": null, "platform": "naip"}}),
        )
        .unwrap();

        patch.apply(&mut target).unwrap();
        assert_eq!(
            target,
            json!({"properties": {"gsd": 1.0, "platform": "naip"}})
        );
    }

    #[test]
    fn test_json_patch_operations() {
        let mut target = json!({"properties": {"gsd": 1.0}});
        let patch = PatchDocument::from_content_type(
            "application/json-patch+json; charset=utf-8",
            json!([
                {"op": "replace", "path": "/properties/gsd", "value": 0.6},
                {"op": "add", "path": "/properties/platform", "value": "naip"}
            ]),
        )
        .unwrap();

        patch.apply(&mut target).unwrap();
        assert_eq!(target["properties"]["gsd"], 0.6);
        assert_eq!(target["properties"]["platform"], "naip");
    }

    #[test]
    fn test_json_patch_failure_is_validation_error() {
        let mut target = json!({"properties": {}});
        let patch =
            PatchDocument::json(json!([{"op": "remove", "path": "/properties/missing"}])).unwrap();

        let err = patch.apply(&mut target).unwrap_err();
        assert!(matches!(err, StorageError::Validation(ValidationError::InvalidPatch { .. })));
    }

    #[test]
    fn test_plain_json_content_type() {
        assert!(matches!(
            PatchDocument::from_content_type("application/json", json!({"a": 1})).unwrap(),
            PatchDocument::Merge(_)
        ));
        assert!(matches!(
            PatchDocument::from_content_type("application/json", json!([])).unwrap(),
            PatchDocument::Json(_)
        ));
        assert!(PatchDocument::from_content_type("text/plain", json!({})).is_err());
    }

    #[test]
    fn test_outcome_into_item() {
        let outcome = CreateItemOutcome::Created(Item::new("a"));
        assert_eq!(outcome.into_item().map(|i| i.id), Some("a".to_string()));

        let outcome = CreateItemOutcome::Bulk(BulkSummary::new(2));
        assert!(outcome.into_item().is_none());
    }
}
