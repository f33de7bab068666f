//! Core types for the persistence layer.
//!
//! This module provides the catalog resources exchanged with callers and the
//! shapes in which items arrive for ingestion:
//!
//! - [`Collection`], [`Item`], [`Link`] - STAC resources in wire form
//! - [`ItemBatch`] - an ordered group of items for one bulk ingest
//! - [`ItemPayload`] - the body of a create-item call (one item or a batch)
//! - [`Document`] - the stored representation inside the document engine
//!
//! # Examples
//!
//! ```
//! use stac_persistence::types::{Item, ItemPayload};
//! use serde_json::json;
//!
//! let payload = ItemPayload::from_value(json!({
//!     "type": "FeatureCollection",
//!     "features": [
//!         {"type": "Feature", "id": "tile-1", "collection": "naip", "properties": {}},
//!         {"type": "Feature", "id": "tile-2", "collection": "naip", "properties": {}}
//!     ]
//! }))
//! .unwrap();
//!
//! match payload {
//!     ItemPayload::Batch(batch) => assert_eq!(batch.len(), 2),
//!     ItemPayload::Item(_) => unreachable!(),
//! }
//!
//! let item = Item::new("tile-3").with_collection("naip");
//! assert_eq!(item.collection.as_deref(), Some("naip"));
//! ```

mod batch;
mod resource;

pub use batch::{ItemBatch, ItemPayload};
pub use resource::{Collection, Item, Link};

/// The stored form of a resource inside the document engine.
pub type Document = serde_json::Value;
