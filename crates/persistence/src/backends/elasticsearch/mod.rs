//! Elasticsearch backend implementation.
//!
//! Implements [`DocumentEngine`](crate::core::DocumentEngine) over the official
//! `elasticsearch` client. The catalog uses two indices (collections and items)
//! whose mappings come from [`mapping`](crate::mapping); index settings
//! (shards, replicas) come from [`ElasticsearchConfig`].
//!
//! Create-only writes use the `_create` endpoint, so a concurrent writer that
//! already took the id is reported as
//! [`BackendError::DocumentConflict`](crate::error::BackendError::DocumentConflict).
//! Bulk ingest sends one `_bulk` request with a `create` action per document.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stac_persistence::backends::elasticsearch::{ElasticsearchBackend, ElasticsearchConfig};
//! use stac_persistence::client::TransactionClient;
//! use stac_persistence::config::CatalogConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = ElasticsearchBackend::new(ElasticsearchConfig::from_env())?;
//! let client = TransactionClient::new(Arc::new(backend), CatalogConfig::from_env());
//! client.ensure_indices().await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod engine;

pub use backend::{ElasticsearchAuth, ElasticsearchBackend, ElasticsearchConfig};
