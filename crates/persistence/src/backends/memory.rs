//! In-memory document engine.
//!
//! Keeps every index in a process-local map. Useful for tests and for running
//! the catalog without a cluster. Writes follow the same rules as
//! Elasticsearch: create-only writes conflict on existing ids, writing to a
//! missing index creates it without a mapping, and a bulk request applies
//! every action it can and reports the rest.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::{
    Backend, BackendKind, BulkAction, BulkItemFailure, BulkResponse, DocumentEngine,
    IndexCreation, WriteMode,
};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::mapping::IndexMappingSpec;
use crate::types::Document;

#[derive(Debug, Default)]
struct IndexState {
    mapping: Option<IndexMappingSpec>,
    documents: BTreeMap<String, Document>,
}

impl IndexState {
    fn write(&mut self, id: String, document: Document, mode: WriteMode) -> bool {
        if mode == WriteMode::Create && self.documents.contains_key(&id) {
            return false;
        }
        self.documents.insert(id, document);
        true
    }
}

/// Document engine backed by process memory.
#[derive(Default)]
pub struct MemoryEngine {
    indices: RwLock<HashMap<String, IndexState>>,
}

impl Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("indices", &self.indices.read().len())
            .finish()
    }
}

impl MemoryEngine {
    /// Creates an engine with no indices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mapping `name` was created with.
    pub fn mapping(&self, name: &str) -> Option<IndexMappingSpec> {
        self.indices.read().get(name).and_then(|s| s.mapping.clone())
    }

    /// Number of documents stored in `index`.
    pub fn document_count(&self, index: &str) -> usize {
        self.indices
            .read()
            .get(index)
            .map_or(0, |s| s.documents.len())
    }

    /// Returns true if `name` exists.
    pub fn has_index(&self, name: &str) -> bool {
        self.indices.read().contains_key(name)
    }
}

#[async_trait]
impl Backend for MemoryEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[async_trait]
impl DocumentEngine for MemoryEngine {
    async fn create_index(
        &self,
        name: &str,
        mapping: &IndexMappingSpec,
    ) -> StorageResult<IndexCreation> {
        let mut indices = self.indices.write();
        if indices.contains_key(name) {
            return Ok(IndexCreation::AlreadyExists);
        }
        indices.insert(
            name.to_string(),
            IndexState {
                mapping: Some(mapping.clone()),
                documents: BTreeMap::new(),
            },
        );
        Ok(IndexCreation::Created)
    }

    async fn exists(&self, index: &str, id: &str) -> StorageResult<bool> {
        Ok(self
            .indices
            .read()
            .get(index)
            .is_some_and(|s| s.documents.contains_key(id)))
    }

    async fn get(&self, index: &str, id: &str) -> StorageResult<Option<Document>> {
        Ok(self
            .indices
            .read()
            .get(index)
            .and_then(|s| s.documents.get(id).cloned()))
    }

    async fn index(
        &self,
        index: &str,
        id: &str,
        document: Document,
        mode: WriteMode,
        _refresh: bool,
    ) -> StorageResult<()> {
        let mut indices = self.indices.write();
        let state = indices.entry(index.to_string()).or_default();

        if !state.write(id.to_string(), document, mode) {
            return Err(StorageError::Backend(BackendError::DocumentConflict {
                index: index.to_string(),
                id: id.to_string(),
            }));
        }

        tracing::debug!("Indexed document '{}' into '{}' ({:?})", id, index, mode);
        Ok(())
    }

    async fn delete(&self, index: &str, id: &str, _refresh: bool) -> StorageResult<bool> {
        let removed = self
            .indices
            .write()
            .get_mut(index)
            .and_then(|s| s.documents.remove(id))
            .is_some();

        if removed {
            tracing::debug!("Deleted document '{}' from '{}'", id, index);
        }
        Ok(removed)
    }

    async fn bulk(&self, actions: Vec<BulkAction>, _refresh: bool) -> StorageResult<BulkResponse> {
        let total = actions.len();
        let mut failures = Vec::new();
        let mut indices = self.indices.write();

        for action in actions {
            let state = indices.entry(action.index).or_default();
            if !state.write(action.id.clone(), action.document, action.mode) {
                failures.push(BulkItemFailure {
                    reason: format!("[{}]: version conflict, document already exists", action.id),
                    id: action.id,
                    status: 409,
                });
            }
        }

        Ok(BulkResponse { total, failures })
    }

    async fn refresh(&self, _index: &str) -> StorageResult<()> {
        Ok(())
    }
}
