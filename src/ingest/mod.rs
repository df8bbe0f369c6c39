//! Bulk ingestion
//!
//! - `compression`: key compression for the ID cache
//! - `cache`: external ID to vertex cache with transaction-aware entries
//! - `batch`: the bulk-load decorator

pub mod batch;
pub mod cache;
pub mod compression;

pub use batch::{BatchGraph, LoadStats};
pub use cache::{CacheEntry, VertexIdCache};
pub use compression::{Compression, IdentityCompression, UrlCompression};
