//! Core storage traits and abstractions.
//!
//! This module provides the foundational traits for the catalog adapter:
//!
//! - [`Backend`] - document engine identity and health
//! - [`DocumentEngine`] - the engine calls the adapter is built on
//! - [`CatalogTransactions`] - create/update/patch/delete of items and collections
//! - [`CatalogReader`] - point reads
//! - [`BulkTransactions`] - validated bulk ingestion
//!
//! # Trait Hierarchy
//!
//! ```text
//! Backend
//!     └── DocumentEngine  (Elasticsearch, Memory)
//!
//! CatalogTransactions + CatalogReader   (TransactionClient<E: DocumentEngine>)
//! BulkTransactions                      (BulkTransactionClient<E: DocumentEngine>)
//! ```
//!
//! # Example: Implementing a Document Engine
//!
//! ```ignore
//! use async_trait::async_trait;
//! use stac_persistence::core::{Backend, BackendKind, DocumentEngine};
//!
//! #[derive(Debug)]
//! struct MyEngine;
//!
//! #[async_trait]
//! impl Backend for MyEngine {
//!     fn kind(&self) -> BackendKind {
//!         BackendKind::Custom("my-engine")
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "my-engine"
//!     }
//!
//!     // ...
//! }
//!
//! #[async_trait]
//! impl DocumentEngine for MyEngine {
//!     // ... exists, get, index, delete, bulk, create_index, refresh
//! }
//! ```

pub mod backend;
pub mod bulk;
pub mod engine;
pub mod transaction;

// Re-export main types
pub use backend::{Backend, BackendKind};
pub use bulk::{BulkSummary, BulkTransactions};
pub use engine::{
    BulkAction, BulkItemFailure, BulkResponse, DocumentEngine, IndexCreation, WriteMode,
};
pub use transaction::{
    CatalogReader, CatalogTransactions, CreateItemOutcome, JSON_PATCH_CONTENT_TYPE,
    MERGE_PATCH_CONTENT_TYPE, PatchDocument,
};
