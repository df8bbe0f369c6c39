//! In-memory reference base graph
//!
//! The decorators work over any `PropertyGraph`; real storage engines live
//! outside this crate. `MemoryGraph` is the concrete base used by the tests,
//! the benches and the demo binary, and is not meant as a production store.
//!
//! Arena storage with adjacency lists and an edge-label index, in the same
//! shape as the samyama in-memory store:
//! - vertices: slot -> VertexRecord
//! - edges: slot -> EdgeRecord
//! - outgoing / incoming: vertex slot -> edge slots
//! - label_index: label -> edge slots
//!
//! Support Flags and transactional behavior are chosen at construction, so the
//! same store can stand in for a graph that mints its own IDs or one that
//! only exposes changes on commit.

use super::error::{validate_property_key, GraphError, GraphResult};
use super::property::{PropertyMap, PropertyValue};
use super::traits::{EdgeElement, Element, Features, PropertyGraph};
use super::types::{Direction, Id};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Vertex handle into a [`MemoryGraph`]
///
/// Handles compare by ID. In transactional mode a handle is only usable in
/// the transaction that produced it.
#[derive(Debug, Clone)]
pub struct MemoryVertex {
    id: Id,
    slot: usize,
    epoch: u64,
}

impl Element for MemoryVertex {
    fn id(&self) -> &Id {
        &self.id
    }
}

impl PartialEq for MemoryVertex {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MemoryVertex {}

impl Hash for MemoryVertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Edge handle into a [`MemoryGraph`]
#[derive(Debug, Clone)]
pub struct MemoryEdge {
    id: Id,
    label: String,
    slot: usize,
    epoch: u64,
}

impl Element for MemoryEdge {
    fn id(&self) -> &Id {
        &self.id
    }
}

impl EdgeElement for MemoryEdge {
    fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for MemoryEdge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MemoryEdge {}

impl Hash for MemoryEdge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone)]
struct VertexRecord {
    id: Id,
    properties: PropertyMap,
}

#[derive(Debug, Clone)]
struct EdgeRecord {
    id: Id,
    label: String,
    tail: usize,
    head: usize,
    properties: PropertyMap,
}

#[derive(Debug, Clone, Default)]
struct Store {
    vertices: Vec<Option<VertexRecord>>,
    edges: Vec<Option<EdgeRecord>>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    vertex_index: HashMap<Id, usize>,
    edge_index: HashMap<Id, usize>,
    label_index: HashMap<String, HashSet<usize>>,
    next_vertex_id: u64,
    next_edge_id: u64,
}

impl Store {
    fn mint_vertex_id(&mut self) -> Id {
        loop {
            let id = Id::Int(self.next_vertex_id);
            self.next_vertex_id += 1;
            if !self.vertex_index.contains_key(&id) {
                return id;
            }
        }
    }

    fn mint_edge_id(&mut self) -> Id {
        loop {
            let id = Id::Int(self.next_edge_id);
            self.next_edge_id += 1;
            if !self.edge_index.contains_key(&id) {
                return id;
            }
        }
    }

    fn detach_edge(&mut self, slot: usize) -> Option<EdgeRecord> {
        let record = self.edges.get_mut(slot)?.take()?;
        self.outgoing[record.tail].retain(|&e| e != slot);
        self.incoming[record.head].retain(|&e| e != slot);
        if let Some(slots) = self.label_index.get_mut(&record.label) {
            slots.remove(&slot);
            if slots.is_empty() {
                self.label_index.remove(&record.label);
            }
        }
        self.edge_index.remove(&record.id);
        Some(record)
    }
}

/// In-memory property graph
#[derive(Debug)]
pub struct MemoryGraph {
    features: Features,
    store: Store,
    /// State at the start of the open transaction (transactional mode only)
    snapshot: Option<Store>,
    /// Bumped on every commit or rollback
    epoch: u64,
}

impl MemoryGraph {
    /// Non-transactional graph that accepts caller-chosen IDs
    pub fn new() -> Self {
        Self::with_features(Features {
            supports_vertex_ids: true,
            supports_edge_ids: true,
            supports_transactions: false,
        })
    }

    pub fn with_features(features: Features) -> Self {
        MemoryGraph {
            features,
            store: Store {
                next_vertex_id: 1,
                next_edge_id: 1,
                ..Store::default()
            },
            snapshot: None,
            epoch: 0,
        }
    }

    /// Graph that mints every ID itself, like most disk-backed engines
    pub fn native_ids() -> Self {
        Self::with_features(Features::default())
    }

    pub fn vertex_count(&self) -> usize {
        self.store.vertex_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.store.edge_index.len()
    }

    /// Number of commits and rollbacks so far
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn vertex_handle(&self, slot: usize) -> Option<MemoryVertex> {
        let record = self.store.vertices.get(slot)?.as_ref()?;
        Some(MemoryVertex {
            id: record.id.clone(),
            slot,
            epoch: self.epoch,
        })
    }

    fn edge_handle(&self, slot: usize) -> Option<MemoryEdge> {
        let record = self.store.edges.get(slot)?.as_ref()?;
        Some(MemoryEdge {
            id: record.id.clone(),
            label: record.label.clone(),
            slot,
            epoch: self.epoch,
        })
    }

    fn check_epoch(&self, id: &Id, epoch: u64) -> GraphResult<()> {
        if self.features.supports_transactions && epoch != self.epoch {
            return Err(GraphError::StaleHandle(id.clone()));
        }
        Ok(())
    }

    fn vertex_record(&self, vertex: &MemoryVertex) -> GraphResult<&VertexRecord> {
        self.check_epoch(&vertex.id, vertex.epoch)?;
        match self.store.vertices.get(vertex.slot) {
            Some(Some(record)) if record.id == vertex.id => Ok(record),
            _ => Err(GraphError::VertexNotFound(vertex.id.clone())),
        }
    }

    fn vertex_record_mut(&mut self, vertex: &MemoryVertex) -> GraphResult<&mut VertexRecord> {
        self.vertex_record(vertex)?;
        self.begin_write();
        match self.store.vertices.get_mut(vertex.slot) {
            Some(Some(record)) => Ok(record),
            _ => Err(GraphError::VertexNotFound(vertex.id.clone())),
        }
    }

    fn edge_record(&self, edge: &MemoryEdge) -> GraphResult<&EdgeRecord> {
        self.check_epoch(&edge.id, edge.epoch)?;
        match self.store.edges.get(edge.slot) {
            Some(Some(record)) if record.id == edge.id => Ok(record),
            _ => Err(GraphError::EdgeNotFound(edge.id.clone())),
        }
    }

    fn edge_record_mut(&mut self, edge: &MemoryEdge) -> GraphResult<&mut EdgeRecord> {
        self.edge_record(edge)?;
        self.begin_write();
        match self.store.edges.get_mut(edge.slot) {
            Some(Some(record)) => Ok(record),
            _ => Err(GraphError::EdgeNotFound(edge.id.clone())),
        }
    }

    /// Opens a transaction lazily on the first write
    fn begin_write(&mut self) {
        if self.features.supports_transactions && self.snapshot.is_none() {
            self.snapshot = Some(self.store.clone());
        }
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyGraph for MemoryGraph {
    type Vertex = MemoryVertex;
    type Edge = MemoryEdge;

    fn features(&self) -> Features {
        self.features
    }

    fn add_vertex(&mut self, id: Option<Id>) -> GraphResult<MemoryVertex> {
        let id = match id {
            Some(id) if self.features.supports_vertex_ids => {
                if self.store.vertex_index.contains_key(&id) {
                    return Err(GraphError::DuplicateIdentifier(id));
                }
                id
            }
            _ => self.store.mint_vertex_id(),
        };
        self.begin_write();

        let slot = self.store.vertices.len();
        self.store.vertices.push(Some(VertexRecord {
            id: id.clone(),
            properties: PropertyMap::new(),
        }));
        self.store.outgoing.push(Vec::new());
        self.store.incoming.push(Vec::new());
        self.store.vertex_index.insert(id.clone(), slot);

        Ok(MemoryVertex {
            id,
            slot,
            epoch: self.epoch,
        })
    }

    fn get_vertex(&self, id: &Id) -> GraphResult<Option<MemoryVertex>> {
        Ok(self
            .store
            .vertex_index
            .get(id)
            .and_then(|&slot| self.vertex_handle(slot)))
    }

    fn remove_vertex(&mut self, vertex: &MemoryVertex) -> GraphResult<()> {
        self.vertex_record(vertex)?;
        self.begin_write();

        let mut incident: Vec<usize> = self.store.outgoing[vertex.slot].clone();
        incident.extend(self.store.incoming[vertex.slot].iter().copied());
        for slot in incident {
            // self-loops appear in both lists
            self.store.detach_edge(slot);
        }

        self.store.vertices[vertex.slot] = None;
        self.store.outgoing[vertex.slot].clear();
        self.store.incoming[vertex.slot].clear();
        self.store.vertex_index.remove(&vertex.id);
        Ok(())
    }

    fn vertices(&self) -> GraphResult<Vec<MemoryVertex>> {
        Ok((0..self.store.vertices.len())
            .filter_map(|slot| self.vertex_handle(slot))
            .collect())
    }

    fn add_edge(
        &mut self,
        id: Option<Id>,
        tail: &MemoryVertex,
        head: &MemoryVertex,
        label: &str,
    ) -> GraphResult<MemoryEdge> {
        if label.is_empty() {
            return Err(GraphError::InvalidArgument("edge label can not be empty".to_string()));
        }
        self.vertex_record(tail)?;
        self.vertex_record(head)?;

        let id = match id {
            Some(id) if self.features.supports_edge_ids => {
                if self.store.edge_index.contains_key(&id) {
                    return Err(GraphError::DuplicateIdentifier(id));
                }
                id
            }
            _ => self.store.mint_edge_id(),
        };
        self.begin_write();

        let slot = self.store.edges.len();
        self.store.edges.push(Some(EdgeRecord {
            id: id.clone(),
            label: label.to_string(),
            tail: tail.slot,
            head: head.slot,
            properties: PropertyMap::new(),
        }));
        self.store.outgoing[tail.slot].push(slot);
        self.store.incoming[head.slot].push(slot);
        self.store
            .label_index
            .entry(label.to_string())
            .or_default()
            .insert(slot);
        self.store.edge_index.insert(id.clone(), slot);

        Ok(MemoryEdge {
            id,
            label: label.to_string(),
            slot,
            epoch: self.epoch,
        })
    }

    fn get_edge(&self, id: &Id) -> GraphResult<Option<MemoryEdge>> {
        Ok(self
            .store
            .edge_index
            .get(id)
            .and_then(|&slot| self.edge_handle(slot)))
    }

    fn remove_edge(&mut self, edge: &MemoryEdge) -> GraphResult<()> {
        self.edge_record(edge)?;
        self.begin_write();
        self.store.detach_edge(edge.slot);
        Ok(())
    }

    fn edges(&self) -> GraphResult<Vec<MemoryEdge>> {
        Ok((0..self.store.edges.len())
            .filter_map(|slot| self.edge_handle(slot))
            .collect())
    }

    fn edge_vertex(&self, edge: &MemoryEdge, direction: Direction) -> GraphResult<MemoryVertex> {
        let record = self.edge_record(edge)?;
        let slot = match direction {
            Direction::Out => record.tail,
            Direction::In => record.head,
            Direction::Both => {
                return Err(GraphError::InvalidArgument(
                    "an edge endpoint must be OUT or IN".to_string(),
                ))
            }
        };
        self.vertex_handle(slot)
            .ok_or_else(|| GraphError::EdgeNotFound(edge.id.clone()))
    }

    fn vertex_property(&self, vertex: &MemoryVertex, key: &str) -> GraphResult<Option<PropertyValue>> {
        Ok(self.vertex_record(vertex)?.properties.get(key).cloned())
    }

    fn set_vertex_property(
        &mut self,
        vertex: &MemoryVertex,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        validate_property_key(key)?;
        Ok(self
            .vertex_record_mut(vertex)?
            .properties
            .insert(key.to_string(), value))
    }

    fn remove_vertex_property(
        &mut self,
        vertex: &MemoryVertex,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>> {
        Ok(self.vertex_record_mut(vertex)?.properties.remove(key))
    }

    fn vertex_property_keys(&self, vertex: &MemoryVertex) -> GraphResult<BTreeSet<String>> {
        Ok(self.vertex_record(vertex)?.properties.keys().cloned().collect())
    }

    fn vertex_properties(&self, vertex: &MemoryVertex) -> GraphResult<PropertyMap> {
        Ok(self.vertex_record(vertex)?.properties.clone())
    }

    fn edge_property(&self, edge: &MemoryEdge, key: &str) -> GraphResult<Option<PropertyValue>> {
        Ok(self.edge_record(edge)?.properties.get(key).cloned())
    }

    fn set_edge_property(
        &mut self,
        edge: &MemoryEdge,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        validate_property_key(key)?;
        Ok(self
            .edge_record_mut(edge)?
            .properties
            .insert(key.to_string(), value))
    }

    fn remove_edge_property(&mut self, edge: &MemoryEdge, key: &str) -> GraphResult<Option<PropertyValue>> {
        Ok(self.edge_record_mut(edge)?.properties.remove(key))
    }

    fn edge_property_keys(&self, edge: &MemoryEdge) -> GraphResult<BTreeSet<String>> {
        Ok(self.edge_record(edge)?.properties.keys().cloned().collect())
    }

    fn edge_properties(&self, edge: &MemoryEdge) -> GraphResult<PropertyMap> {
        Ok(self.edge_record(edge)?.properties.clone())
    }

    fn vertex_edges(
        &self,
        vertex: &MemoryVertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<MemoryEdge>> {
        self.vertex_record(vertex)?;
        let slots: Vec<usize> = match direction {
            Direction::Out => self.store.outgoing[vertex.slot].clone(),
            Direction::In => self.store.incoming[vertex.slot].clone(),
            Direction::Both => {
                let mut both = self.store.outgoing[vertex.slot].clone();
                both.extend(self.store.incoming[vertex.slot].iter().copied());
                both
            }
        };

        Ok(slots
            .into_iter()
            .filter(|slot| {
                labels.is_empty()
                    || labels.iter().any(|label| {
                        self.store
                            .label_index
                            .get(*label)
                            .map_or(false, |s| s.contains(slot))
                    })
            })
            .filter_map(|slot| self.edge_handle(slot))
            .collect())
    }

    fn commit(&mut self) -> GraphResult<()> {
        if !self.features.supports_transactions {
            return Err(GraphError::UnsupportedOperation("commit"));
        }
        self.snapshot = None;
        self.epoch += 1;
        debug!("Committed transaction, epoch now {}", self.epoch);
        Ok(())
    }

    fn rollback(&mut self) -> GraphResult<()> {
        if !self.features.supports_transactions {
            return Err(GraphError::UnsupportedOperation("rollback"));
        }
        if let Some(snapshot) = self.snapshot.take() {
            self.store = snapshot;
        }
        self.epoch += 1;
        debug!("Rolled back transaction, epoch now {}", self.epoch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transactional() -> MemoryGraph {
        MemoryGraph::with_features(Features {
            supports_vertex_ids: true,
            supports_edge_ids: true,
            supports_transactions: true,
        })
    }

    #[test]
    fn test_create_and_get_vertex() {
        let mut graph = MemoryGraph::new();
        let v = graph.add_vertex(Some("alice".into())).unwrap();

        assert_eq!(graph.vertex_count(), 1);
        let fetched = graph.get_vertex(&"alice".into()).unwrap().unwrap();
        assert_eq!(fetched, v);
        assert!(graph.get_vertex(&"bob".into()).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_vertex_id() {
        let mut graph = MemoryGraph::new();
        graph.add_vertex(Some(1u64.into())).unwrap();
        let result = graph.add_vertex(Some(1u64.into()));
        assert!(matches!(result, Err(GraphError::DuplicateIdentifier(Id::Int(1)))));
    }

    #[test]
    fn test_minted_ids_skip_caller_ids() {
        let mut graph = MemoryGraph::new();
        graph.add_vertex(Some(1u64.into())).unwrap();
        let minted = graph.add_vertex(None).unwrap();
        assert_eq!(minted.id(), &Id::Int(2));
    }

    #[test]
    fn test_native_ids_ignore_supplied_id() {
        let mut graph = MemoryGraph::native_ids();
        let v = graph.add_vertex(Some("alice".into())).unwrap();
        assert_eq!(v.id(), &Id::Int(1));
        assert!(graph.get_vertex(&"alice".into()).unwrap().is_none());
    }

    #[test]
    fn test_edges_and_adjacency() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_vertex(None).unwrap();
        let b = graph.add_vertex(None).unwrap();
        let c = graph.add_vertex(None).unwrap();

        let ab = graph.add_edge(None, &a, &b, "knows").unwrap();
        graph.add_edge(None, &a, &c, "likes").unwrap();
        graph.add_edge(None, &c, &a, "knows").unwrap();

        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edge_vertex(&ab, Direction::Out).unwrap(), a);
        assert_eq!(graph.edge_vertex(&ab, Direction::In).unwrap(), b);
        assert!(graph.edge_vertex(&ab, Direction::Both).is_err());

        assert_eq!(graph.vertex_edges(&a, Direction::Out, &[]).unwrap().len(), 2);
        assert_eq!(graph.vertex_edges(&a, Direction::Out, &["knows"]).unwrap().len(), 1);
        assert_eq!(graph.vertex_edges(&a, Direction::In, &[]).unwrap().len(), 1);
        assert_eq!(graph.vertex_edges(&a, Direction::Both, &["knows"]).unwrap().len(), 2);

        let out = graph.adjacent_vertices(&a, Direction::Out, &[]).unwrap();
        assert_eq!(out, vec![b.clone(), c.clone()]);
        let both = graph.adjacent_vertices(&a, Direction::Both, &["knows"]).unwrap();
        assert_eq!(both, vec![b, c]);
    }

    #[test]
    fn test_remove_vertex_drops_incident_edges() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_vertex(None).unwrap();
        let b = graph.add_vertex(None).unwrap();
        graph.add_edge(None, &a, &b, "knows").unwrap();
        graph.add_edge(None, &a, &a, "self").unwrap();

        graph.remove_vertex(&a).unwrap();
        assert_eq!(graph.vertex_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.vertex_edges(&b, Direction::Both, &[]).unwrap().is_empty());
        assert!(matches!(graph.remove_vertex(&a), Err(GraphError::VertexNotFound(_))));
    }

    #[test]
    fn test_properties() {
        let mut graph = MemoryGraph::new();
        let v = graph.add_vertex(None).unwrap();

        assert_eq!(graph.set_vertex_property(&v, "name", "Alice".into()).unwrap(), None);
        let old = graph.set_vertex_property(&v, "name", "Alicia".into()).unwrap();
        assert_eq!(old, Some("Alice".into()));
        graph.set_vertex_property(&v, "age", 30i64.into()).unwrap();

        let keys: Vec<String> = graph.vertex_property_keys(&v).unwrap().into_iter().collect();
        assert_eq!(keys, vec!["age".to_string(), "name".to_string()]);

        assert_eq!(graph.remove_vertex_property(&v, "age").unwrap(), Some(30i64.into()));
        assert_eq!(graph.remove_vertex_property(&v, "age").unwrap(), None);
        assert!(graph.set_vertex_property(&v, "id", 1i64.into()).is_err());

        let found = graph.vertices_with("name", &"Alicia".into()).unwrap();
        assert_eq!(found, vec![v]);
    }

    #[test]
    fn test_query_filters() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_vertex(None).unwrap();
        let b = graph.add_vertex(None).unwrap();
        let c = graph.add_vertex(None).unwrap();
        let ab = graph.add_edge(None, &a, &b, "knows").unwrap();
        let ac = graph.add_edge(None, &a, &c, "knows").unwrap();
        graph.set_edge_property(&ab, "weight", 1i64.into()).unwrap();
        graph.set_edge_property(&ac, "weight", 2i64.into()).unwrap();

        let q = graph.query(&a).direction(Direction::Out).labels(["knows"]).has("weight", 2i64);
        assert_eq!(q.edges(&graph).unwrap(), vec![ac]);
        assert_eq!(q.vertices(&graph).unwrap(), vec![c]);

        let limited = graph.query(&a).direction(Direction::Out).limit(1);
        assert_eq!(limited.count(&graph).unwrap(), 1);
        assert_eq!(graph.query(&b).count(&graph).unwrap(), 1);
    }

    #[test]
    fn test_non_transactional_commit_unsupported() {
        let mut graph = MemoryGraph::new();
        assert!(matches!(graph.commit(), Err(GraphError::UnsupportedOperation("commit"))));
        assert!(matches!(graph.rollback(), Err(GraphError::UnsupportedOperation("rollback"))));
    }

    #[test]
    fn test_commit_invalidates_handles() {
        let mut graph = transactional();
        let v = graph.add_vertex(Some("a".into())).unwrap();
        graph.commit().unwrap();

        assert!(matches!(
            graph.vertex_property(&v, "name"),
            Err(GraphError::StaleHandle(_))
        ));
        let fresh = graph.get_vertex(&"a".into()).unwrap().unwrap();
        assert!(graph.set_vertex_property(&fresh, "name", "A".into()).is_ok());
    }

    #[test]
    fn test_rollback_restores_state() {
        let mut graph = transactional();
        graph.add_vertex(Some("kept".into())).unwrap();
        graph.commit().unwrap();

        graph.add_vertex(Some("dropped".into())).unwrap();
        assert_eq!(graph.vertex_count(), 2);
        graph.rollback().unwrap();

        assert_eq!(graph.vertex_count(), 1);
        assert!(graph.get_vertex(&"dropped".into()).unwrap().is_none());
        assert_eq!(graph.epoch(), 2);
    }
}
