//! STAC Catalog Persistence Layer
//!
//! This crate stores STAC collections and items in a document engine that has
//! no multi-document transactions (Elasticsearch), and layers a consistency
//! policy on top: referential checks, uniqueness checks, create-only writes
//! and a configurable update strategy.
//!
//! # Features
//!
//! - **Index mappings**: dynamic templates for STAC extension fields, evaluable
//!   locally for tests
//! - **Transactions**: create, update, patch and delete of items and
//!   collections with typed consistency errors
//! - **Bulk ingest**: validate a whole batch, then write it in one request
//! - **Backends**: Elasticsearch (feature `elasticsearch`, default) and an
//!   in-memory engine
//!
//! # Architecture
//!
//! - [`types`] - STAC resources, batches and payloads
//! - [`mapping`] - index mappings and idempotent index creation
//! - [`serializer`] - wire form to stored document and back
//! - [`links`] - server-generated hypermedia links
//! - [`core`] - engine contract and catalog traits
//! - [`client`] - transaction and bulk clients, consistency guard
//! - [`backends`] - engine implementations
//! - [`config`] - catalog configuration
//! - [`error`] - error types and outward categories
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use stac_persistence::backends::memory::MemoryEngine;
//! use stac_persistence::client::TransactionClient;
//! use stac_persistence::config::CatalogConfig;
//! use stac_persistence::core::{CatalogTransactions, CreateItemOutcome};
//! use stac_persistence::types::{Collection, Item};
//!
//! # tokio_test_block(async {
//! let client = TransactionClient::new(Arc::new(MemoryEngine::new()), CatalogConfig::default());
//! let base_url = "http://localhost:8080/";
//!
//! client
//!     .create_collection(Collection::new("naip"), base_url, true)
//!     .await
//!     .unwrap();
//!
//! let outcome = client
//!     .create_item("naip", Item::new("tile-1").into(), base_url, true)
//!     .await
//!     .unwrap();
//! let item = outcome.into_item().unwrap();
//! assert_eq!(item.collection_id(), "naip");
//!
//! // Same id again is a conflict
//! let err = client
//!     .create_item("naip", Item::new("tile-1").into(), base_url, true)
//!     .await
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "Item tile-1 already exists");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! # Error Categories
//!
//! Every [`StorageError`] maps to an [`ErrorCategory`](error::ErrorCategory)
//! with a conventional status code:
//!
//! ```
//! use stac_persistence::error::{ErrorCategory, StorageError};
//!
//! let err = StorageError::foreign_key("missing");
//! assert_eq!(err.to_string(), "Collection missing does not exist");
//! assert_eq!(err.category(), ErrorCategory::BadReference);
//! assert_eq!(err.category().status_code(), 424);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod links;
pub mod mapping;
pub mod serializer;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{CatalogConfig, UpdateStrategy};
pub use error::{ErrorCategory, StorageError, StorageResult};
pub use mapping::{IndexMappingSpec, ensure_index};
pub use types::{Collection, Item, ItemBatch, ItemPayload, Link};

// Re-export core traits
pub use core::{
    Backend, BackendKind, BulkTransactions, CatalogReader, CatalogTransactions, DocumentEngine,
};

// Re-export clients
pub use client::{BulkTransactionClient, ConsistencyGuard, TransactionClient};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
