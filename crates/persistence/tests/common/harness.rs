//! Test harness: client construction and a failure-injecting engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use stac_persistence::backends::memory::MemoryEngine;
use stac_persistence::client::TransactionClient;
use stac_persistence::config::{CatalogConfig, UpdateStrategy};
use stac_persistence::core::{
    Backend, BackendKind, BulkAction, BulkResponse, DocumentEngine, IndexCreation, WriteMode,
};
use stac_persistence::error::{BackendError, StorageError, StorageResult};
use stac_persistence::mapping::IndexMappingSpec;
use stac_persistence::types::Document;

/// Installs a tracing subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An in-memory engine that can be told to misbehave.
///
/// - `fail_next_index` makes the next single-document write fail
/// - `set_blind_index` makes existence checks on one index report nothing, so
///   pre-write checks pass and only the write itself can catch a conflict
#[derive(Debug, Default)]
pub struct FailingEngine {
    inner: MemoryEngine,
    fail_next_index: AtomicBool,
    blind_index: Mutex<Option<String>>,
    index_calls: AtomicUsize,
    bulk_calls: AtomicUsize,
}

impl FailingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped engine, for direct inspection.
    pub fn inner(&self) -> &MemoryEngine {
        &self.inner
    }

    pub fn fail_next_index(&self) {
        self.fail_next_index.store(true, Ordering::SeqCst);
    }

    pub fn set_blind_index(&self, index: Option<&str>) {
        *self.blind_index.lock() = index.map(str::to_string);
    }

    /// Number of single-document writes attempted.
    pub fn index_calls(&self) -> usize {
        self.index_calls.load(Ordering::SeqCst)
    }

    /// Number of bulk requests received.
    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FailingEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::Custom("failing-memory")
    }

    fn name(&self) -> &'static str {
        "failing-memory"
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        self.inner.health_check().await
    }
}

#[async_trait]
impl DocumentEngine for FailingEngine {
    async fn create_index(
        &self,
        name: &str,
        mapping: &IndexMappingSpec,
    ) -> StorageResult<IndexCreation> {
        self.inner.create_index(name, mapping).await
    }

    async fn exists(&self, index: &str, id: &str) -> StorageResult<bool> {
        if self.blind_index.lock().as_deref() == Some(index) {
            return Ok(false);
        }
        self.inner.exists(index, id).await
    }

    async fn get(&self, index: &str, id: &str) -> StorageResult<Option<Document>> {
        self.inner.get(index, id).await
    }

    async fn index(
        &self,
        index: &str,
        id: &str,
        document: Document,
        mode: WriteMode,
        refresh: bool,
    ) -> StorageResult<()> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_index.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Backend(BackendError::Unavailable {
                backend_name: "failing-memory".to_string(),
                message: "injected write failure".to_string(),
            }));
        }
        self.inner.index(index, id, document, mode, refresh).await
    }

    async fn delete(&self, index: &str, id: &str, refresh: bool) -> StorageResult<bool> {
        self.inner.delete(index, id, refresh).await
    }

    async fn bulk(&self, actions: Vec<BulkAction>, refresh: bool) -> StorageResult<BulkResponse> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.bulk(actions, refresh).await
    }

    async fn refresh(&self, index: &str) -> StorageResult<()> {
        self.inner.refresh(index).await
    }
}

/// A client over a fresh in-memory engine.
pub fn memory_client() -> (Arc<MemoryEngine>, TransactionClient<MemoryEngine>) {
    init_tracing();
    let engine = Arc::new(MemoryEngine::new());
    let client = TransactionClient::new(Arc::clone(&engine), CatalogConfig::default());
    (engine, client)
}

/// A client over a fresh failure-injecting engine using `strategy` for updates.
pub fn failing_client(
    strategy: UpdateStrategy,
) -> (Arc<FailingEngine>, TransactionClient<FailingEngine>) {
    init_tracing();
    let engine = Arc::new(FailingEngine::new());
    let config = CatalogConfig::default().with_update_strategy(strategy);
    let client = TransactionClient::new(Arc::clone(&engine), config);
    (engine, client)
}
