//! External ID -> vertex identity cache used during bulk loading
//!
//! Entries start out `Live`, holding the handle returned when the vertex was
//! created. Handles are only valid inside the transaction that produced them,
//! so at every transaction boundary the owner calls
//! [`VertexIdCache::begin_new_transaction`], which swaps each live handle for
//! the vertex ID (`Persisted`). Entries are never removed.

use super::compression::{Compression, IdentityCompression};
use crate::graph::{Element, Id};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Cached identity of one vertex
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry<V> {
    /// Handle created in the current transaction
    Live(V),
    /// ID that survives transaction boundaries
    Persisted(Id),
}

impl<V: Element> CacheEntry<V> {
    /// The vertex ID, whichever form the entry is in
    pub fn id(&self) -> &Id {
        match self {
            CacheEntry::Live(vertex) => vertex.id(),
            CacheEntry::Persisted(id) => id,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, CacheEntry::Live(_))
    }

    fn persist(&mut self) {
        if let CacheEntry::Live(vertex) = self {
            *self = CacheEntry::Persisted(vertex.id().clone());
        }
    }
}

pub struct VertexIdCache<V> {
    compression: Box<dyn Compression>,
    entries: FxHashMap<String, CacheEntry<V>>,
    /// Keys written as `Live` since the last boundary
    live_keys: Vec<String>,
}

impl<V: Element> VertexIdCache<V> {
    pub fn new(compression: Box<dyn Compression>) -> Self {
        Self {
            compression,
            entries: FxHashMap::default(),
            live_keys: Vec::new(),
        }
    }

    fn key(&mut self, external_id: &Id) -> String {
        self.compression.compress(&external_id.to_string())
    }

    pub fn get_entry(&mut self, external_id: &Id) -> Option<&CacheEntry<V>> {
        let key = self.key(external_id);
        self.entries.get(&key)
    }

    /// Store a live handle, replacing any previous entry for the same key
    pub fn set(&mut self, vertex: V, external_id: &Id) {
        let key = self.key(external_id);
        self.live_keys.push(key.clone());
        self.entries.insert(key, CacheEntry::Live(vertex));
    }

    /// Store an already persisted vertex ID
    pub fn set_id(&mut self, internal_id: Id, external_id: &Id) {
        let key = self.key(external_id);
        self.entries.insert(key, CacheEntry::Persisted(internal_id));
    }

    pub fn contains(&mut self, external_id: &Id) -> bool {
        let key = self.key(external_id);
        self.entries.contains_key(&key)
    }

    /// Convert every live entry to its persisted form.
    ///
    /// Must run after the wrapped graph committed and before any handle from
    /// the finished transaction is used again.
    pub fn begin_new_transaction(&mut self) {
        let converted = self.live_keys.len();
        for key in self.live_keys.drain(..) {
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.persist();
            }
        }
        trace!("Persisted {} live cache entries", converted);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_live()).count()
    }
}

impl<V: Element> Default for VertexIdCache<V> {
    fn default() -> Self {
        Self::new(Box::new(IdentityCompression))
    }
}
