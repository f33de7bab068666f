//! Document engine implementations.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | always | Process-local maps, for tests and single-node use |
//! | Elasticsearch | `elasticsearch` | The production catalog store |
//!
//! # Example
//!
//! ```
//! use stac_persistence::backends::memory::MemoryEngine;
//! use stac_persistence::core::Backend;
//!
//! let engine = MemoryEngine::new();
//! assert_eq!(engine.name(), "memory");
//! ```

pub mod memory;

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;
