//! Backend abstraction for document engines.
//!
//! This module defines the [`Backend`] trait, the identity and health surface
//! every document engine exposes. The storage operations themselves live on
//! [`DocumentEngine`](super::DocumentEngine).

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BackendError;

/// Identifies the type of document engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Elasticsearch (search engine).
    Elasticsearch,
    /// In-process engine, used for tests and embedding.
    Memory,
    /// Custom or unknown backend.
    Custom(&'static str),
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Elasticsearch => write!(f, "elasticsearch"),
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// A document engine that the catalog adapter can talk to.
///
/// Implementations hold one long-lived connection handle that is shared,
/// read-only, by every operation. They must be cheap to share behind an `Arc`.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &'static str;

    /// Checks if the backend is healthy and accepting requests.
    async fn health_check(&self) -> Result<(), BackendError>;
}
