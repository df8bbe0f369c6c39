//! Property-graph capability contract
//!
//! This module defines what every graph in the crate looks like:
//! - Opaque identifiers and edge directions
//! - Property values and property snapshots
//! - The `PropertyGraph` trait, with optional transactions and a query builder
//! - An in-memory reference base graph for tests, benches and the demo

pub mod error;
pub mod memory;
pub mod property;
pub mod query;
pub mod traits;
pub mod types;

pub use error::{GraphError, GraphResult};
pub use memory::{MemoryEdge, MemoryGraph, MemoryVertex};
pub use property::{PropertyMap, PropertyValue};
pub use query::VertexQuery;
pub use traits::{EdgeElement, Element, Features, PropertyGraph};
pub use types::{Direction, Id};
