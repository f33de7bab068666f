//! Catalog clients built on a [`DocumentEngine`](crate::core::DocumentEngine).
//!
//! - [`TransactionClient`] - single-resource writes and point reads
//! - [`BulkTransactionClient`] - validated all-or-nothing batch ingest
//! - [`ConsistencyGuard`] - the pre-write checks both clients share
//!
//! Both clients hold the same `Arc` engine handle; build the engine once at
//! startup and pass clones of the `Arc` around.

mod bulk;
mod guard;
mod transactions;

pub use bulk::BulkTransactionClient;
pub use guard::ConsistencyGuard;
pub use transactions::TransactionClient;

use crate::error::{StorageResult, ValidationError};
use crate::types::Item;

/// Assigns `collection_id` to an item that names no collection, and rejects
/// one that names a different collection.
pub(crate) fn bind_to_collection(item: &mut Item, collection_id: &str) -> StorageResult<()> {
    match item.collection.as_deref() {
        None | Some("") => {
            item.collection = Some(collection_id.to_string());
            Ok(())
        }
        Some(body) if body == collection_id => Ok(()),
        Some(body) => Err(ValidationError::CollectionMismatch {
            item_id: item.id.clone(),
            body_collection: body.to_string(),
            path_collection: collection_id.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[test]
    fn test_bind_defaults_missing_collection() {
        let mut item = Item::new("tile-1");
        bind_to_collection(&mut item, "naip").unwrap();
        assert_eq!(item.collection_id(), "naip");
    }

    #[test]
    fn test_bind_rejects_mismatch() {
        let mut item = Item::new("tile-1").with_collection("landsat");
        let err = bind_to_collection(&mut item, "naip").unwrap_err();
        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::CollectionMismatch { .. })
        ));
        assert_eq!(item.collection_id(), "landsat");
    }
}
