//! Samyama Graph Wrappers
//!
//! Composable decorators over a minimal property-graph contract. Each
//! decorator implements the same [`PropertyGraph`] trait it wraps, so they
//! stack in any order on top of any base graph.
//!
//! # Components
//!
//! - [`graph`]: the capability contract and an in-memory base graph
//! - [`IdGraph`]: stable caller-chosen IDs over graphs that mint their own
//! - [`EventGraph`]: ordered change notification to registered listeners
//! - [`BatchGraph`]: bulk loading keyed by external IDs, with a compressing
//!   vertex cache and explicit transaction boundaries
//! - [`config`]: serde/YAML settings for the decorators
//!
//! ## Example Usage
//!
//! ```rust
//! use samyama_wrappers::graph::{Direction, Element, MemoryGraph, PropertyGraph};
//! use samyama_wrappers::BatchGraph;
//!
//! let mut loader = BatchGraph::new(MemoryGraph::native_ids());
//! loader.add_edge_by_ids(None, &"A".into(), &"B".into(), "knows").unwrap();
//! loader.add_edge_by_ids(None, &"A".into(), &"C".into(), "knows").unwrap();
//! loader.shutdown().unwrap();
//!
//! let a = loader.get_vertex(&"A".into()).unwrap().unwrap();
//! let friends = loader.adjacent_vertices(&a, Direction::Out, &["knows"]).unwrap();
//! assert_eq!(friends.len(), 2);
//! assert_eq!(friends[0].id().to_string(), "B");
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod event;
pub mod graph;
pub mod idgraph;
pub mod ingest;

// Re-export main types for convenience
pub use config::{BatchConfig, CompressionKind, DispatchMode, EventConfig, WrapperConfig};
pub use event::{EventGraph, GraphChangedListener, GraphEvent, ListenerId, LoggingListener};
pub use graph::{
    Direction, EdgeElement, Element, Features, GraphError, GraphResult, Id, MemoryGraph,
    PropertyGraph, PropertyMap, PropertyValue, VertexQuery,
};
pub use idgraph::{IdEdge, IdFactory, IdGraph, IdVertex, UuidFactory};
pub use ingest::{
    BatchGraph, CacheEntry, Compression, IdentityCompression, LoadStats, UrlCompression,
    VertexIdCache,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
