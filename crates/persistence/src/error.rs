//! Error types for the persistence layer.
//!
//! This module defines all error types used by the catalog adapter, following a
//! hierarchy that separates resource-state errors (the checked consistency
//! failures), validation errors, and errors originating from the document
//! engine.
//!
//! Every error maps to a stable [`ErrorCategory`] so the transport layer can
//! turn it into a response without inspecting individual variants.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors (foreign key, duplicate, not found)
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Document engine errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// The kind of catalog resource an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A STAC collection.
    Collection,
    /// A STAC item.
    Item,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Collection => write!(f, "Collection"),
            ResourceKind::Item => write!(f, "Item"),
        }
    }
}

/// Errors related to resource state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The collection referenced by an item does not exist.
    #[error("Collection {collection_id} does not exist")]
    ForeignKeyViolation { collection_id: String },

    /// A resource with the given ID already exists.
    #[error("{resource_kind} {id} already exists")]
    AlreadyExists { resource_kind: ResourceKind, id: String },

    /// The requested resource was not found.
    #[error("{resource_kind} {id} not found")]
    NotFound { resource_kind: ResourceKind, id: String },
}

/// Errors related to request validation performed by the adapter itself.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The item body names a different collection than the request path.
    #[error("item {item_id} belongs to collection {body_collection}, not {path_collection}")]
    CollectionMismatch {
        item_id: String,
        body_collection: String,
        path_collection: String,
    },

    /// The payload could not be interpreted as a catalog resource.
    #[error("invalid resource: {message}")]
    InvalidResource { message: String },

    /// A patch document could not be parsed or applied.
    #[error("invalid patch: {message}")]
    InvalidPatch { message: String },
}

/// Errors originating from the document engine.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The engine is currently unavailable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the engine failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// A create-only write hit an existing document.
    #[error("document {id} already exists in index {index}")]
    DocumentConflict { index: String, id: String },

    /// The bulk request was accepted but reported failed actions.
    #[error("bulk request to {backend_name} failed for {failed} of {total} actions: {message}")]
    BulkFailure {
        backend_name: String,
        failed: usize,
        total: usize,
        message: String,
    },

    /// Internal engine error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Stable outward category of an error.
///
/// | Category | Status | Raised by |
/// |----------|--------|-----------|
/// | BadReference | 424 | `ForeignKeyViolation` |
/// | Conflict | 409 | `AlreadyExists`, engine `DocumentConflict` |
/// | NotFound | 404 | `NotFound` |
/// | Invalid | 400 | `ValidationError` |
/// | Internal | 500 | any other `BackendError` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A referenced resource does not exist.
    BadReference,
    /// The identifier is already taken.
    Conflict,
    /// The target resource does not exist.
    NotFound,
    /// The request could not be interpreted.
    Invalid,
    /// Unexpected engine failure.
    Internal,
}

impl ErrorCategory {
    /// Returns the HTTP status code conventionally used for this category.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::BadReference => 424,
            ErrorCategory::Conflict => 409,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Invalid => 400,
            ErrorCategory::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::BadReference => write!(f, "bad-reference"),
            ErrorCategory::Conflict => write!(f, "conflict"),
            ErrorCategory::NotFound => write!(f, "not-found"),
            ErrorCategory::Invalid => write!(f, "invalid"),
            ErrorCategory::Internal => write!(f, "internal"),
        }
    }
}

impl StorageError {
    /// Returns the outward category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            StorageError::Resource(ResourceError::ForeignKeyViolation { .. }) => {
                ErrorCategory::BadReference
            }
            StorageError::Resource(ResourceError::AlreadyExists { .. }) => ErrorCategory::Conflict,
            StorageError::Resource(ResourceError::NotFound { .. }) => ErrorCategory::NotFound,
            StorageError::Validation(_) => ErrorCategory::Invalid,
            StorageError::Backend(BackendError::DocumentConflict { .. }) => ErrorCategory::Conflict,
            StorageError::Backend(_) => ErrorCategory::Internal,
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(resource_kind: ResourceKind, id: impl Into<String>) -> Self {
        StorageError::Resource(ResourceError::NotFound {
            resource_kind,
            id: id.into(),
        })
    }

    /// Shorthand for an `AlreadyExists` error.
    pub fn already_exists(resource_kind: ResourceKind, id: impl Into<String>) -> Self {
        StorageError::Resource(ResourceError::AlreadyExists {
            resource_kind,
            id: id.into(),
        })
    }

    /// Shorthand for a `ForeignKeyViolation` error.
    pub fn foreign_key(collection_id: impl Into<String>) -> Self {
        StorageError::Resource(ResourceError::ForeignKeyViolation {
            collection_id: collection_id.into(),
        })
    }

    /// Returns true if this is a `NotFound` resource error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// Implement conversions from common error types

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

impl From<json_patch::PatchError> for StorageError {
    fn from(err: json_patch::PatchError) -> Self {
        StorageError::Validation(ValidationError::InvalidPatch {
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_display() {
        let err = StorageError::foreign_key("missing");
        assert_eq!(err.to_string(), "Collection missing does not exist");
        assert_eq!(err.category(), ErrorCategory::BadReference);
    }

    #[test]
    fn test_already_exists_display() {
        let err = StorageError::already_exists(ResourceKind::Item, "tile-1");
        assert_eq!(err.to_string(), "Item tile-1 already exists");
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_not_found_display() {
        let err = StorageError::not_found(ResourceKind::Collection, "naip");
        assert_eq!(err.to_string(), "Collection naip not found");
        assert!(err.is_not_found());
        assert_eq!(err.category().status_code(), 404);
    }

    #[test]
    fn test_categories_are_distinct() {
        let categories = [
            StorageError::foreign_key("c").category(),
            StorageError::already_exists(ResourceKind::Item, "i").category(),
            StorageError::not_found(ResourceKind::Item, "i").category(),
            StorageError::Backend(BackendError::Unavailable {
                backend_name: "elasticsearch".to_string(),
                message: "down".to_string(),
            })
            .category(),
        ];
        for (i, a) in categories.iter().enumerate() {
            for b in &categories[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_engine_conflict_is_conflict() {
        let err = StorageError::Backend(BackendError::DocumentConflict {
            index: "stac_items".to_string(),
            id: "a".to_string(),
        });
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.to_string().contains("stac_items"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StorageError = serde_err.into();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::SerializationError { .. })
        ));
        assert_eq!(err.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::BadReference.to_string(), "bad-reference");
        assert_eq!(ErrorCategory::Invalid.status_code(), 400);
    }
}
