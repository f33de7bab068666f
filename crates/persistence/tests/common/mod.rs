//! Test infrastructure for the catalog persistence layer.
//!
//! Provides STAC fixtures and an engine wrapper that can inject failures into
//! an otherwise in-memory engine.

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

// Re-export commonly used items
pub use fixtures::*;
pub use harness::*;
