//! The document engine contract.
//!
//! Everything the catalog adapter needs from the underlying engine is a point
//! read, a single-document write or delete, one bulk write, and idempotent
//! index creation. Engines provide no multi-document transactions; the
//! consistency policy built on top of these calls lives in
//! [`client`](crate::client).

use async_trait::async_trait;

use crate::error::{BackendError, StorageResult};
use crate::mapping::IndexMappingSpec;
use crate::types::Document;

use super::backend::Backend;

/// Write semantics for a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// Create-only: the write fails with
    /// [`BackendError::DocumentConflict`] if the id is already taken.
    Create,
    /// Replace whatever is stored under the id, or create it.
    Overwrite,
}

/// Outcome of an index creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreation {
    /// The index did not exist and was created with the given mapping.
    Created,
    /// The index was already present; nothing changed.
    AlreadyExists,
}

/// One document write inside a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkAction {
    /// Target index.
    pub index: String,
    /// Document id.
    pub id: String,
    /// Document body.
    pub document: Document,
    /// Write semantics.
    pub mode: WriteMode,
}

impl BulkAction {
    /// A create-only action.
    pub fn create(index: impl Into<String>, id: impl Into<String>, document: Document) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            document,
            mode: WriteMode::Create,
        }
    }
}

/// A single failed action reported by a bulk response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// Document id of the failed action.
    pub id: String,
    /// Engine status code for the action.
    pub status: u16,
    /// Engine-provided reason.
    pub reason: String,
}

/// Result of a bulk request that reached the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResponse {
    /// Number of actions the engine processed.
    pub total: usize,
    /// Actions the engine rejected.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkResponse {
    /// Returns true if any action failed.
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Converts a response with failed actions into an error.
    ///
    /// No reconciliation is attempted: the first failure is reported and the
    /// caller sees the whole request as failed.
    pub fn into_result(self, backend_name: &str) -> StorageResult<usize> {
        match self.failures.first() {
            None => Ok(self.total),
            Some(first) => Err(BackendError::BulkFailure {
                backend_name: backend_name.to_string(),
                failed: self.failures.len(),
                total: self.total,
                message: format!("{} (status {}): {}", first.id, first.status, first.reason),
            }
            .into()),
        }
    }
}

/// Storage operations of a document engine.
///
/// `refresh` controls whether a write is visible to subsequent reads as soon as
/// the call returns.
#[async_trait]
pub trait DocumentEngine: Backend {
    /// Creates `name` with `mapping` unless it already exists.
    async fn create_index(
        &self,
        name: &str,
        mapping: &IndexMappingSpec,
    ) -> StorageResult<IndexCreation>;

    /// Returns true if a document with `id` is stored in `index`.
    async fn exists(&self, index: &str, id: &str) -> StorageResult<bool>;

    /// Returns the document stored under `id`, or `None`.
    async fn get(&self, index: &str, id: &str) -> StorageResult<Option<Document>>;

    /// Writes one document.
    async fn index(
        &self,
        index: &str,
        id: &str,
        document: Document,
        mode: WriteMode,
        refresh: bool,
    ) -> StorageResult<()>;

    /// Deletes one document. Returns false if nothing was stored under `id`.
    async fn delete(&self, index: &str, id: &str, refresh: bool) -> StorageResult<bool>;

    /// Sends all actions in one request.
    async fn bulk(&self, actions: Vec<BulkAction>, refresh: bool) -> StorageResult<BulkResponse>;

    /// Makes all previous writes to `index` visible to reads.
    async fn refresh(&self, index: &str) -> StorageResult<()>;
}
