//! ID-virtualization decorator
//!
//! `IdGraph` lets callers choose element IDs even when the wrapped graph
//! mints its own. For each kind (vertex, edge) whose Support Flag is off, a
//! private bidirectional table maps caller IDs to native IDs; every element
//! handed back to the caller is wrapped so it only ever shows the caller ID.
//! When a flag is on, that kind passes straight through.
//!
//! Tables only grow, except that entries added in a transaction that is
//! rolled back are dropped with it. Removing an element leaves its entry
//! behind; later lookups simply fail to find the native element.
//!
//! A listener error from the wrapped graph means the element was stored
//! before dispatch, so its translation is still recorded.

use crate::graph::{
    Direction, EdgeElement, Element, Features, GraphError, GraphResult, Id, PropertyGraph,
    PropertyValue,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::trace;
use uuid::Uuid;

/// Source of caller IDs for elements added without one
pub trait IdFactory {
    fn create_id(&mut self) -> Id;
}

impl<F: FnMut() -> Id> IdFactory for F {
    fn create_id(&mut self) -> Id {
        self()
    }
}

/// Random UUID v4 strings
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidFactory;

impl IdFactory for UuidFactory {
    fn create_id(&mut self) -> Id {
        Id::Str(Uuid::new_v4().to_string())
    }
}

/// Vertex as seen through an [`IdGraph`]
#[derive(Debug, Clone)]
pub struct IdVertex<V> {
    id: Id,
    base: V,
}

impl<V> IdVertex<V> {
    /// The undecorated vertex of the wrapped graph
    pub fn base(&self) -> &V {
        &self.base
    }

    pub fn into_base(self) -> V {
        self.base
    }
}

impl<V: Element> Element for IdVertex<V> {
    fn id(&self) -> &Id {
        &self.id
    }
}

impl<V> PartialEq for IdVertex<V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V> Eq for IdVertex<V> {}

impl<V> Hash for IdVertex<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<V> fmt::Display for IdVertex<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v[{}]", self.id)
    }
}

/// Edge as seen through an [`IdGraph`]
#[derive(Debug, Clone)]
pub struct IdEdge<E> {
    id: Id,
    base: E,
}

impl<E> IdEdge<E> {
    /// The undecorated edge of the wrapped graph
    pub fn base(&self) -> &E {
        &self.base
    }

    pub fn into_base(self) -> E {
        self.base
    }
}

impl<E: EdgeElement> Element for IdEdge<E> {
    fn id(&self) -> &Id {
        &self.id
    }
}

impl<E: EdgeElement> EdgeElement for IdEdge<E> {
    fn label(&self) -> &str {
        self.base.label()
    }
}

impl<E> PartialEq for IdEdge<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<E> Eq for IdEdge<E> {}

impl<E> Hash for IdEdge<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<E> fmt::Display for IdEdge<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e[{}]", self.id)
    }
}

/// Caller ID <-> native ID table for one element kind
#[derive(Debug, Default)]
struct Translation {
    to_native: FxHashMap<Id, Id>,
    to_external: FxHashMap<Id, Id>,
    /// External IDs added since the last commit (transactional bases only)
    uncommitted: Vec<Id>,
}

impl Translation {
    fn insert(&mut self, external: Id, native: Id, transactional: bool) {
        if transactional {
            self.uncommitted.push(external.clone());
        }
        self.to_external.insert(native.clone(), external.clone());
        self.to_native.insert(external, native);
    }

    fn commit(&mut self) {
        self.uncommitted.clear();
    }

    fn discard_uncommitted(&mut self) -> usize {
        let discarded = self.uncommitted.len();
        for external in self.uncommitted.drain(..) {
            if let Some(native) = self.to_native.remove(&external) {
                self.to_external.remove(&native);
            }
        }
        discarded
    }

    fn len(&self) -> usize {
        self.to_native.len()
    }
}

pub struct IdGraph<G> {
    base: G,
    vertex_ids_supported: bool,
    edge_ids_supported: bool,
    transactional: bool,
    vertex_ids: Translation,
    edge_ids: Translation,
    id_factory: Box<dyn IdFactory>,
}

impl<G: PropertyGraph> IdGraph<G> {
    /// Wrap `base`, capturing its Support Flags
    pub fn new(base: G) -> Self {
        let features = base.features();
        Self {
            base,
            vertex_ids_supported: features.supports_vertex_ids,
            edge_ids_supported: features.supports_edge_ids,
            transactional: features.supports_transactions,
            vertex_ids: Translation::default(),
            edge_ids: Translation::default(),
            id_factory: Box::new(UuidFactory),
        }
    }

    pub fn with_id_factory(mut self, factory: impl IdFactory + 'static) -> Self {
        self.id_factory = Box::new(factory);
        self
    }

    pub fn base(&self) -> &G {
        &self.base
    }

    /// Direct access to the wrapped graph. Elements created through it get
    /// no translation entry.
    pub fn base_mut(&mut self) -> &mut G {
        &mut self.base
    }

    pub fn into_inner(self) -> G {
        self.base
    }

    /// Number of translated vertex and edge IDs
    pub fn translated_counts(&self) -> (usize, usize) {
        (self.vertex_ids.len(), self.edge_ids.len())
    }

    /// Caller ID for a native vertex ID
    pub fn external_vertex_id(&self, native: &Id) -> Id {
        if self.vertex_ids_supported {
            return native.clone();
        }
        self.vertex_ids
            .to_external
            .get(native)
            .cloned()
            .unwrap_or_else(|| native.clone())
    }

    pub fn external_edge_id(&self, native: &Id) -> Id {
        if self.edge_ids_supported {
            return native.clone();
        }
        self.edge_ids
            .to_external
            .get(native)
            .cloned()
            .unwrap_or_else(|| native.clone())
    }

    fn native_vertex_id<'a>(&'a self, external: &'a Id) -> &'a Id {
        if self.vertex_ids_supported {
            return external;
        }
        self.vertex_ids.to_native.get(external).unwrap_or(external)
    }

    fn native_edge_id<'a>(&'a self, external: &'a Id) -> &'a Id {
        if self.edge_ids_supported {
            return external;
        }
        self.edge_ids.to_native.get(external).unwrap_or(external)
    }

    fn wrap_vertex(&self, base: G::Vertex) -> IdVertex<G::Vertex> {
        IdVertex {
            id: self.external_vertex_id(base.id()),
            base,
        }
    }

    fn wrap_edge(&self, base: G::Edge) -> IdEdge<G::Edge> {
        IdEdge {
            id: self.external_edge_id(base.id()),
            base,
        }
    }

    fn wrap_vertices(&self, vertices: Vec<G::Vertex>) -> Vec<IdVertex<G::Vertex>> {
        vertices.into_iter().map(|v| self.wrap_vertex(v)).collect()
    }

    fn wrap_edges(&self, edges: Vec<G::Edge>) -> Vec<IdEdge<G::Edge>> {
        edges.into_iter().map(|e| self.wrap_edge(e)).collect()
    }

    /// Report listener failures under the caller ID of the vertex
    fn vertex_error(&self, err: GraphError) -> GraphError {
        match err {
            GraphError::Listener { element, cause } => GraphError::Listener {
                element: self.external_vertex_id(&element),
                cause,
            },
            err => err,
        }
    }

    fn edge_error(&self, err: GraphError) -> GraphError {
        match err {
            GraphError::Listener { element, cause } => GraphError::Listener {
                element: self.external_edge_id(&element),
                cause,
            },
            err => err,
        }
    }
}

impl<G: PropertyGraph> PropertyGraph for IdGraph<G> {
    type Vertex = IdVertex<G::Vertex>;
    type Edge = IdEdge<G::Edge>;

    fn features(&self) -> Features {
        Features {
            supports_vertex_ids: true,
            supports_edge_ids: true,
            ..self.base.features()
        }
    }

    fn add_vertex(&mut self, id: Option<Id>) -> GraphResult<Self::Vertex> {
        if self.vertex_ids_supported {
            let base = self.base.add_vertex(id)?;
            return Ok(self.wrap_vertex(base));
        }

        let external = id.unwrap_or_else(|| self.id_factory.create_id());
        if self.vertex_ids.to_native.contains_key(&external) {
            return Err(GraphError::DuplicateIdentifier(external));
        }
        let base = match self.base.add_vertex(None) {
            Ok(base) => base,
            Err(GraphError::Listener { element, cause }) => {
                self.vertex_ids.insert(external.clone(), element, self.transactional);
                return Err(GraphError::Listener {
                    element: external,
                    cause,
                });
            }
            Err(err) => return Err(err),
        };
        trace!("Vertex {} stored under native id {}", external, base.id());
        self.vertex_ids
            .insert(external.clone(), base.id().clone(), self.transactional);
        Ok(IdVertex { id: external, base })
    }

    fn get_vertex(&self, id: &Id) -> GraphResult<Option<Self::Vertex>> {
        let found = self.base.get_vertex(self.native_vertex_id(id))?;
        // a native ID that was translated is not visible under its native form
        Ok(found
            .map(|base| self.wrap_vertex(base))
            .filter(|vertex| vertex.id() == id))
    }

    fn remove_vertex(&mut self, vertex: &Self::Vertex) -> GraphResult<()> {
        self.base
            .remove_vertex(&vertex.base)
            .map_err(|err| self.vertex_error(err))
    }

    fn vertices(&self) -> GraphResult<Vec<Self::Vertex>> {
        Ok(self.wrap_vertices(self.base.vertices()?))
    }

    fn vertices_with(&self, key: &str, value: &PropertyValue) -> GraphResult<Vec<Self::Vertex>> {
        Ok(self.wrap_vertices(self.base.vertices_with(key, value)?))
    }

    fn add_edge(
        &mut self,
        id: Option<Id>,
        tail: &Self::Vertex,
        head: &Self::Vertex,
        label: &str,
    ) -> GraphResult<Self::Edge> {
        if self.edge_ids_supported {
            let base = self.base.add_edge(id, &tail.base, &head.base, label)?;
            return Ok(self.wrap_edge(base));
        }

        let external = id.unwrap_or_else(|| self.id_factory.create_id());
        if self.edge_ids.to_native.contains_key(&external) {
            return Err(GraphError::DuplicateIdentifier(external));
        }
        let base = match self.base.add_edge(None, &tail.base, &head.base, label) {
            Ok(base) => base,
            Err(GraphError::Listener { element, cause }) => {
                self.edge_ids.insert(external.clone(), element, self.transactional);
                return Err(GraphError::Listener {
                    element: external,
                    cause,
                });
            }
            Err(err) => return Err(err),
        };
        trace!("Edge {} stored under native id {}", external, base.id());
        self.edge_ids
            .insert(external.clone(), base.id().clone(), self.transactional);
        Ok(IdEdge { id: external, base })
    }

    fn get_edge(&self, id: &Id) -> GraphResult<Option<Self::Edge>> {
        let found = self.base.get_edge(self.native_edge_id(id))?;
        Ok(found
            .map(|base| self.wrap_edge(base))
            .filter(|edge| edge.id() == id))
    }

    fn remove_edge(&mut self, edge: &Self::Edge) -> GraphResult<()> {
        self.base
            .remove_edge(&edge.base)
            .map_err(|err| self.edge_error(err))
    }

    fn edges(&self) -> GraphResult<Vec<Self::Edge>> {
        Ok(self.wrap_edges(self.base.edges()?))
    }

    fn edges_with(&self, key: &str, value: &PropertyValue) -> GraphResult<Vec<Self::Edge>> {
        Ok(self.wrap_edges(self.base.edges_with(key, value)?))
    }

    fn edge_vertex(&self, edge: &Self::Edge, direction: Direction) -> GraphResult<Self::Vertex> {
        Ok(self.wrap_vertex(self.base.edge_vertex(&edge.base, direction)?))
    }

    fn vertex_property(&self, vertex: &Self::Vertex, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.base.vertex_property(&vertex.base, key)
    }

    fn set_vertex_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        self.base
            .set_vertex_property(&vertex.base, key, value)
            .map_err(|err| self.vertex_error(err))
    }

    fn remove_vertex_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>> {
        self.base
            .remove_vertex_property(&vertex.base, key)
            .map_err(|err| self.vertex_error(err))
    }

    fn vertex_property_keys(&self, vertex: &Self::Vertex) -> GraphResult<BTreeSet<String>> {
        self.base.vertex_property_keys(&vertex.base)
    }

    fn edge_property(&self, edge: &Self::Edge, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.base.edge_property(&edge.base, key)
    }

    fn set_edge_property(
        &mut self,
        edge: &Self::Edge,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        self.base
            .set_edge_property(&edge.base, key, value)
            .map_err(|err| self.edge_error(err))
    }

    fn remove_edge_property(&mut self, edge: &Self::Edge, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.base
            .remove_edge_property(&edge.base, key)
            .map_err(|err| self.edge_error(err))
    }

    fn edge_property_keys(&self, edge: &Self::Edge) -> GraphResult<BTreeSet<String>> {
        self.base.edge_property_keys(&edge.base)
    }

    fn vertex_edges(
        &self,
        vertex: &Self::Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Self::Edge>> {
        Ok(self.wrap_edges(self.base.vertex_edges(&vertex.base, direction, labels)?))
    }

    fn adjacent_vertices(
        &self,
        vertex: &Self::Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Self::Vertex>> {
        Ok(self.wrap_vertices(self.base.adjacent_vertices(&vertex.base, direction, labels)?))
    }

    fn commit(&mut self) -> GraphResult<()> {
        let result = self.base.commit();
        // a listener error means the base commit went through
        if matches!(result, Ok(()) | Err(GraphError::Listener { .. })) {
            self.vertex_ids.commit();
            self.edge_ids.commit();
        }
        result
    }

    fn rollback(&mut self) -> GraphResult<()> {
        self.base.rollback()?;
        let discarded = self.vertex_ids.discard_uncommitted() + self.edge_ids.discard_uncommitted();
        if discarded > 0 {
            trace!("Dropped {} translations from the rolled back transaction", discarded);
        }
        Ok(())
    }

    fn shutdown(&mut self) -> GraphResult<()> {
        self.base.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventGraph, GraphChangedListener};
    use crate::graph::{MemoryEdge, MemoryGraph, MemoryVertex};

    fn counter_factory() -> impl IdFactory {
        let mut next = 0u64;
        move || {
            next += 1;
            Id::Str(format!("gen-{}", next))
        }
    }

    #[test]
    fn test_round_trip_over_native_ids() {
        let mut graph = IdGraph::new(MemoryGraph::native_ids());
        let v = graph.add_vertex(Some("alice".into())).unwrap();

        assert_eq!(v.id(), &Id::from("alice"));
        assert_eq!(v.base().id(), &Id::Int(1));

        let fetched = graph.get_vertex(&"alice".into()).unwrap().unwrap();
        assert_eq!(fetched, v);
        assert_eq!(fetched.id(), &Id::from("alice"));
        assert_eq!(graph.translated_counts(), (1, 0));
    }

    #[test]
    fn test_native_form_of_translated_id_is_hidden() {
        let mut graph = IdGraph::new(MemoryGraph::native_ids());
        graph.add_vertex(Some("alice".into())).unwrap();
        assert!(graph.get_vertex(&Id::Int(1)).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_external_id() {
        let mut graph = IdGraph::new(MemoryGraph::native_ids());
        graph.add_vertex(Some("alice".into())).unwrap();
        let result = graph.add_vertex(Some("alice".into()));
        assert!(matches!(result, Err(GraphError::DuplicateIdentifier(_))));
        assert_eq!(graph.base().vertex_count(), 1);
    }

    #[test]
    fn test_pass_through_when_supported() {
        let mut graph = IdGraph::new(MemoryGraph::new());
        let v = graph.add_vertex(Some("alice".into())).unwrap();
        assert_eq!(v.base().id(), &Id::from("alice"));
        assert_eq!(graph.translated_counts(), (0, 0));

        let result = graph.add_vertex(Some("alice".into()));
        assert!(matches!(result, Err(GraphError::DuplicateIdentifier(_))));
    }

    #[test]
    fn test_generated_ids() {
        let mut graph = IdGraph::new(MemoryGraph::native_ids()).with_id_factory(counter_factory());
        let a = graph.add_vertex(None).unwrap();
        let b = graph.add_vertex(None).unwrap();
        assert_eq!(a.id(), &Id::from("gen-1"));
        assert_eq!(b.id(), &Id::from("gen-2"));
    }

    #[test]
    fn test_uuid_ids_by_default() {
        let mut graph = IdGraph::new(MemoryGraph::native_ids());
        let v = graph.add_vertex(None).unwrap();
        let id = v.id().as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_edges_are_virtualized() {
        let mut graph = IdGraph::new(MemoryGraph::native_ids());
        let a = graph.add_vertex(Some("a".into())).unwrap();
        let b = graph.add_vertex(Some("b".into())).unwrap();
        let e = graph.add_edge(Some("a-knows-b".into()), &a, &b, "knows").unwrap();

        assert_eq!(e.label(), "knows");
        assert_eq!(e.to_string(), "e[a-knows-b]");
        assert_eq!(graph.edge_vertex(&e, Direction::Out).unwrap().id(), &Id::from("a"));
        assert_eq!(graph.edge_vertex(&e, Direction::In).unwrap().id(), &Id::from("b"));

        let out = graph.vertex_edges(&a, Direction::Out, &["knows"]).unwrap();
        assert_eq!(out, vec![e.clone()]);
        let adjacent = graph.adjacent_vertices(&a, Direction::Out, &[]).unwrap();
        assert_eq!(adjacent[0].to_string(), "v[b]");

        let fetched = graph.get_edge(&"a-knows-b".into()).unwrap().unwrap();
        assert_eq!(fetched, e);
    }

    #[test]
    fn test_iteration_and_queries_wrap_results() {
        let mut graph = IdGraph::new(MemoryGraph::native_ids());
        let a = graph.add_vertex(Some("a".into())).unwrap();
        let b = graph.add_vertex(Some("b".into())).unwrap();
        let e = graph.add_edge(None, &a, &b, "knows").unwrap();
        graph.set_vertex_property(&b, "name", "Bob".into()).unwrap();
        graph.set_edge_property(&e, "weight", 3i64.into()).unwrap();

        let ids: Vec<Id> = graph.vertices().unwrap().iter().map(|v| v.id().clone()).collect();
        assert_eq!(ids, vec![Id::from("a"), Id::from("b")]);

        let named = graph.vertices_with("name", &"Bob".into()).unwrap();
        assert_eq!(named, vec![b.clone()]);

        let found = graph.query(&a).direction(Direction::Out).has("weight", 3i64).vertices(&graph).unwrap();
        assert_eq!(found, vec![b]);
        assert_eq!(graph.edges().unwrap(), vec![e]);
    }

    #[test]
    fn test_removed_element_is_not_found() {
        let mut graph = IdGraph::new(MemoryGraph::native_ids());
        let v = graph.add_vertex(Some("a".into())).unwrap();
        graph.remove_vertex(&v).unwrap();
        assert!(graph.get_vertex(&"a".into()).unwrap().is_none());
        assert_eq!(graph.translated_counts(), (1, 0));
    }

    #[test]
    fn test_untranslated_base_elements_keep_native_ids() {
        let mut base = MemoryGraph::native_ids();
        base.add_vertex(None).unwrap();
        let graph = IdGraph::new(base);

        let vertices = graph.vertices().unwrap();
        assert_eq!(vertices[0].id(), &Id::Int(1));
        assert!(graph.get_vertex(&Id::Int(1)).unwrap().is_some());
    }

    #[test]
    fn test_wraps_borrowed_base() {
        let mut base = MemoryGraph::native_ids();
        {
            let mut graph = IdGraph::new(&mut base);
            graph.add_vertex(Some("a".into())).unwrap();
        }
        assert_eq!(base.vertex_count(), 1);
    }

    fn transactional_native() -> MemoryGraph {
        MemoryGraph::with_features(Features {
            supports_vertex_ids: false,
            supports_edge_ids: false,
            supports_transactions: true,
        })
    }

    #[test]
    fn test_rollback_drops_uncommitted_translations() {
        let mut graph = IdGraph::new(transactional_native());
        graph.add_vertex(Some("kept".into())).unwrap();
        graph.commit().unwrap();

        let a = graph.add_vertex(Some("a".into())).unwrap();
        let b = graph.add_vertex(Some("b".into())).unwrap();
        graph.add_edge(Some("ab".into()), &a, &b, "knows").unwrap();
        graph.rollback().unwrap();

        assert!(graph.get_vertex(&"a".into()).unwrap().is_none());
        assert_eq!(graph.translated_counts(), (1, 0));

        let again = graph.add_vertex(Some("a".into())).unwrap();
        assert_eq!(again.id(), &Id::from("a"));
        assert!(graph.get_vertex(&"a".into()).unwrap().is_some());
        assert!(graph.get_vertex(&"kept".into()).unwrap().is_some());
    }

    #[test]
    fn test_commit_keeps_translations_through_later_rollback() {
        let mut graph = IdGraph::new(transactional_native());
        graph.add_vertex(Some("a".into())).unwrap();
        graph.commit().unwrap();
        graph.rollback().unwrap();

        assert!(graph.get_vertex(&"a".into()).unwrap().is_some());
        assert!(matches!(
            graph.add_vertex(Some("a".into())),
            Err(GraphError::DuplicateIdentifier(_))
        ));
    }

    /// Fails on the first vertex it is told about
    struct FailFirstVertex {
        failed: bool,
    }

    impl GraphChangedListener<MemoryVertex, MemoryEdge> for FailFirstVertex {
        fn vertex_added(&mut self, _vertex: &MemoryVertex) -> anyhow::Result<()> {
            if !self.failed {
                self.failed = true;
                anyhow::bail!("transient");
            }
            Ok(())
        }
    }

    #[test]
    fn test_listener_failure_still_records_translation() {
        let mut events = EventGraph::new(MemoryGraph::native_ids());
        events.add_listener(FailFirstVertex { failed: false });
        let mut graph = IdGraph::new(events);

        let result = graph.add_vertex(Some("a".into()));
        assert!(matches!(
            result,
            Err(GraphError::Listener { ref element, .. }) if *element == Id::from("a")
        ));

        assert!(graph.get_vertex(&"a".into()).unwrap().is_some());
        assert!(matches!(
            graph.add_vertex(Some("a".into())),
            Err(GraphError::DuplicateIdentifier(_))
        ));
        assert_eq!(graph.base().base().vertex_count(), 1);
    }

    #[test]
    fn test_reports_id_support() {
        let graph = IdGraph::new(MemoryGraph::native_ids());
        let features = graph.features();
        assert!(features.supports_vertex_ids);
        assert!(features.supports_edge_ids);
        assert!(!features.supports_transactions);
    }
}
