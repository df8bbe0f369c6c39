//! Bulk-load decorator
//!
//! `BatchGraph` ingests vertices and edges keyed by external IDs. A
//! [`VertexIdCache`] remembers every external ID already loaded so each
//! vertex is created once, and [`BatchGraph::notify_transaction_boundary`]
//! commits the wrapped graph and turns cached handles into plain IDs.
//!
//! The wrapped graph is always placed behind an [`IdGraph`], so external IDs
//! stay stable whether or not the base graph accepts caller-chosen IDs.
//! Loading is append-only: removals and full scans are not supported.

use super::cache::{CacheEntry, VertexIdCache};
use super::compression::Compression;
use crate::config::BatchConfig;
use crate::graph::{
    Direction, Element, Features, GraphError, GraphResult, Id, PropertyGraph, PropertyValue,
};
use crate::idgraph::{IdEdge, IdGraph, IdVertex};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Counters reported by [`BatchGraph::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub vertices_created: u64,
    /// Lookups answered by the cache or, in incremental mode, the graph
    pub vertex_hits: u64,
    pub edges_created: u64,
    pub transaction_boundaries: u64,
}

pub struct BatchGraph<G: PropertyGraph> {
    graph: IdGraph<G>,
    cache: VertexIdCache<IdVertex<G::Vertex>>,
    config: BatchConfig,
    stats: LoadStats,
    /// Mutations since the last boundary
    pending_mutations: u64,
}

impl<G: PropertyGraph> BatchGraph<G> {
    /// Load into `base` with the default configuration
    pub fn new(base: G) -> Self {
        let config = BatchConfig::default();
        let compression = config.compression.build();
        Self::from_parts(base, config, compression)
    }

    pub fn with_config(base: G, config: BatchConfig) -> GraphResult<Self> {
        config.validate()?;
        let compression = config.compression.build();
        Ok(Self::from_parts(base, config, compression))
    }

    /// Use a custom compression strategy instead of `config.compression`
    pub fn with_compression(
        base: G,
        config: BatchConfig,
        compression: Box<dyn Compression>,
    ) -> GraphResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(base, config, compression))
    }

    fn from_parts(base: G, config: BatchConfig, compression: Box<dyn Compression>) -> Self {
        Self {
            graph: IdGraph::new(base),
            cache: VertexIdCache::new(compression),
            config,
            stats: LoadStats::default(),
            pending_mutations: 0,
        }
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Number of external IDs seen so far
    pub fn cached_vertices(&self) -> usize {
        self.cache.len()
    }

    pub fn graph(&self) -> &IdGraph<G> {
        &self.graph
    }

    /// Hand back the wrapped graph without driving a final boundary
    pub fn into_inner(self) -> IdGraph<G> {
        self.graph
    }

    /// Return the vertex loaded under `external_id`, creating it on first sight
    pub fn get_or_create_vertex(&mut self, external_id: &Id) -> GraphResult<IdVertex<G::Vertex>> {
        self.flush_if_full()?;
        self.resolve_or_create(external_id)
    }

    /// Add an edge between two vertices named by external ID, creating
    /// either endpoint if it has not been seen yet
    pub fn add_edge_by_ids(
        &mut self,
        id: Option<Id>,
        tail: &Id,
        head: &Id,
        label: &str,
    ) -> GraphResult<IdEdge<G::Edge>> {
        self.flush_if_full()?;
        let tail = self.resolve_or_create(tail)?;
        let head = self.resolve_or_create(head)?;
        self.create_edge(id, &tail, &head, label)
    }

    /// Commit the wrapped graph when it is transactional, then persist every
    /// live cache entry.
    ///
    /// Handles obtained before this call must not be used with the wrapped
    /// graph afterwards; handles passed back into the loader are re-resolved.
    pub fn notify_transaction_boundary(&mut self) -> GraphResult<()> {
        let committed = if self.graph.features().supports_transactions {
            match self.graph.commit() {
                // the commit itself went through before dispatch failed
                Err(err @ GraphError::Listener { .. }) => Err(err),
                Err(err) => return Err(err),
                Ok(()) => Ok(()),
            }
        } else {
            Ok(())
        };
        self.cache.begin_new_transaction();
        self.stats.transaction_boundaries += 1;
        debug!(
            "Transaction boundary {} after {} mutations ({} vertices cached)",
            self.stats.transaction_boundaries,
            self.pending_mutations,
            self.cache.len()
        );
        self.pending_mutations = 0;
        committed
    }

    fn flush_if_full(&mut self) -> GraphResult<()> {
        match self.config.buffer_size {
            Some(size) if self.pending_mutations >= size => self.notify_transaction_boundary(),
            _ => Ok(()),
        }
    }

    fn resolve_or_create(&mut self, external_id: &Id) -> GraphResult<IdVertex<G::Vertex>> {
        if let Some(vertex) = self.cached_vertex(external_id)? {
            self.stats.vertex_hits += 1;
            return Ok(vertex);
        }
        if self.config.incremental {
            if let Some(vertex) = self.graph.get_vertex(external_id)? {
                self.cache.set_id(vertex.id().clone(), external_id);
                self.stats.vertex_hits += 1;
                return Ok(vertex);
            }
        }
        self.create_vertex(external_id)
    }

    fn cached_vertex(&mut self, external_id: &Id) -> GraphResult<Option<IdVertex<G::Vertex>>> {
        match self.cache.get_entry(external_id) {
            None => Ok(None),
            Some(CacheEntry::Live(vertex)) => Ok(Some(vertex.clone())),
            Some(CacheEntry::Persisted(id)) => {
                let id = id.clone();
                match self.graph.get_vertex(&id)? {
                    Some(vertex) => Ok(Some(vertex)),
                    None => Err(GraphError::VertexNotFound(id)),
                }
            }
        }
    }

    /// The vertex is cached as soon as it exists, even if a listener or the
    /// ID property write fails afterwards.
    fn create_vertex(&mut self, external_id: &Id) -> GraphResult<IdVertex<G::Vertex>> {
        let vertex = match self.graph.add_vertex(Some(external_id.clone())) {
            Ok(vertex) => vertex,
            Err(GraphError::Listener { element, cause }) => {
                self.cache.set_id(element.clone(), external_id);
                self.stats.vertices_created += 1;
                self.pending_mutations += 1;
                return Err(GraphError::Listener { element, cause });
            }
            Err(err) => return Err(err),
        };
        self.cache.set(vertex.clone(), external_id);
        self.stats.vertices_created += 1;
        self.pending_mutations += 1;

        if let Some(key) = &self.config.vertex_id_key {
            self.graph
                .set_vertex_property(&vertex, key, PropertyValue::from(external_id))?;
        }
        Ok(vertex)
    }

    fn create_edge(
        &mut self,
        id: Option<Id>,
        tail: &IdVertex<G::Vertex>,
        head: &IdVertex<G::Vertex>,
        label: &str,
    ) -> GraphResult<IdEdge<G::Edge>> {
        let edge = match self.graph.add_edge(id, tail, head, label) {
            Ok(edge) => edge,
            Err(err @ GraphError::Listener { .. }) => {
                self.stats.edges_created += 1;
                self.pending_mutations += 1;
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        self.stats.edges_created += 1;
        self.pending_mutations += 1;

        // minted edge IDs are written too
        if let Some(key) = &self.config.edge_id_key {
            self.graph
                .set_edge_property(&edge, key, PropertyValue::from(edge.id()))?;
        }
        Ok(edge)
    }

    /// Handles go stale at boundaries only when the wrapped graph is transactional
    fn fresh_vertex(&self, vertex: &IdVertex<G::Vertex>) -> GraphResult<IdVertex<G::Vertex>> {
        if !self.graph.features().supports_transactions {
            return Ok(vertex.clone());
        }
        self.graph
            .get_vertex(vertex.id())?
            .ok_or_else(|| GraphError::VertexNotFound(vertex.id().clone()))
    }

    fn fresh_edge(&self, edge: &IdEdge<G::Edge>) -> GraphResult<IdEdge<G::Edge>> {
        if !self.graph.features().supports_transactions {
            return Ok(edge.clone());
        }
        self.graph
            .get_edge(edge.id())?
            .ok_or_else(|| GraphError::EdgeNotFound(edge.id().clone()))
    }
}

impl<G: PropertyGraph> PropertyGraph for BatchGraph<G> {
    type Vertex = IdVertex<G::Vertex>;
    type Edge = IdEdge<G::Edge>;

    fn features(&self) -> Features {
        self.graph.features()
    }

    /// Bulk loading needs an external ID for every vertex
    fn add_vertex(&mut self, id: Option<Id>) -> GraphResult<Self::Vertex> {
        let id = id.ok_or_else(|| {
            GraphError::InvalidArgument("bulk loading requires an external vertex id".to_string())
        })?;
        self.flush_if_full()?;
        if self.cache.contains(&id)
            || (self.config.incremental && self.graph.get_vertex(&id)?.is_some())
        {
            return Err(GraphError::DuplicateIdentifier(id));
        }
        self.create_vertex(&id)
    }

    fn get_vertex(&self, id: &Id) -> GraphResult<Option<Self::Vertex>> {
        self.graph.get_vertex(id)
    }

    fn remove_vertex(&mut self, _vertex: &Self::Vertex) -> GraphResult<()> {
        Err(GraphError::UnsupportedOperation("remove_vertex during bulk loading"))
    }

    fn vertices(&self) -> GraphResult<Vec<Self::Vertex>> {
        Err(GraphError::UnsupportedOperation("vertices during bulk loading"))
    }

    fn vertices_with(&self, _key: &str, _value: &PropertyValue) -> GraphResult<Vec<Self::Vertex>> {
        Err(GraphError::UnsupportedOperation("vertices_with during bulk loading"))
    }

    fn add_edge(
        &mut self,
        id: Option<Id>,
        tail: &Self::Vertex,
        head: &Self::Vertex,
        label: &str,
    ) -> GraphResult<Self::Edge> {
        self.flush_if_full()?;
        let tail = self.fresh_vertex(tail)?;
        let head = self.fresh_vertex(head)?;
        self.create_edge(id, &tail, &head, label)
    }

    fn get_edge(&self, id: &Id) -> GraphResult<Option<Self::Edge>> {
        self.graph.get_edge(id)
    }

    fn remove_edge(&mut self, _edge: &Self::Edge) -> GraphResult<()> {
        Err(GraphError::UnsupportedOperation("remove_edge during bulk loading"))
    }

    fn edges(&self) -> GraphResult<Vec<Self::Edge>> {
        Err(GraphError::UnsupportedOperation("edges during bulk loading"))
    }

    fn edges_with(&self, _key: &str, _value: &PropertyValue) -> GraphResult<Vec<Self::Edge>> {
        Err(GraphError::UnsupportedOperation("edges_with during bulk loading"))
    }

    fn edge_vertex(&self, edge: &Self::Edge, direction: Direction) -> GraphResult<Self::Vertex> {
        self.graph.edge_vertex(&self.fresh_edge(edge)?, direction)
    }

    fn vertex_property(&self, vertex: &Self::Vertex, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.graph.vertex_property(&self.fresh_vertex(vertex)?, key)
    }

    fn set_vertex_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        self.flush_if_full()?;
        let vertex = self.fresh_vertex(vertex)?;
        let old = self.graph.set_vertex_property(&vertex, key, value)?;
        self.pending_mutations += 1;
        Ok(old)
    }

    fn remove_vertex_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>> {
        self.flush_if_full()?;
        let vertex = self.fresh_vertex(vertex)?;
        let removed = self.graph.remove_vertex_property(&vertex, key)?;
        self.pending_mutations += 1;
        Ok(removed)
    }

    fn vertex_property_keys(&self, vertex: &Self::Vertex) -> GraphResult<BTreeSet<String>> {
        self.graph.vertex_property_keys(&self.fresh_vertex(vertex)?)
    }

    fn edge_property(&self, edge: &Self::Edge, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.graph.edge_property(&self.fresh_edge(edge)?, key)
    }

    fn set_edge_property(
        &mut self,
        edge: &Self::Edge,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        self.flush_if_full()?;
        let edge = self.fresh_edge(edge)?;
        let old = self.graph.set_edge_property(&edge, key, value)?;
        self.pending_mutations += 1;
        Ok(old)
    }

    fn remove_edge_property(&mut self, edge: &Self::Edge, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.flush_if_full()?;
        let edge = self.fresh_edge(edge)?;
        let removed = self.graph.remove_edge_property(&edge, key)?;
        self.pending_mutations += 1;
        Ok(removed)
    }

    fn edge_property_keys(&self, edge: &Self::Edge) -> GraphResult<BTreeSet<String>> {
        self.graph.edge_property_keys(&self.fresh_edge(edge)?)
    }

    fn vertex_edges(
        &self,
        vertex: &Self::Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Self::Edge>> {
        self.graph.vertex_edges(&self.fresh_vertex(vertex)?, direction, labels)
    }

    fn adjacent_vertices(
        &self,
        vertex: &Self::Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Self::Vertex>> {
        self.graph
            .adjacent_vertices(&self.fresh_vertex(vertex)?, direction, labels)
    }

    fn commit(&mut self) -> GraphResult<()> {
        self.notify_transaction_boundary()
    }

    /// Earlier buffers are already durable, so there is nothing coherent to roll back to
    fn rollback(&mut self) -> GraphResult<()> {
        Err(GraphError::UnsupportedOperation("rollback during bulk loading"))
    }

    fn shutdown(&mut self) -> GraphResult<()> {
        self.notify_transaction_boundary()?;
        info!(
            "Bulk load finished: {} vertices, {} edges, {} cache hits, {} transaction boundaries",
            self.stats.vertices_created,
            self.stats.edges_created,
            self.stats.vertex_hits,
            self.stats.transaction_boundaries
        );
        self.graph.shutdown()
    }
}
