//! Change-notification decorator
//!
//! `EventGraph` performs every mutation on the wrapped graph first and then
//! hands an immutable [`GraphEvent`] to each registered listener, in
//! registration order, on the calling thread. A listener error stops dispatch
//! of that event and is returned from the mutating call; the mutation itself
//! is not undone.

use super::events::GraphEvent;
use super::listener::GraphChangedListener;
use crate::config::{DispatchMode, EventConfig};
use crate::graph::{Direction, Features, GraphError, GraphResult, Id, PropertyGraph, PropertyValue};
use std::collections::BTreeSet;
use tracing::{trace, warn};

/// Handle returned by [`EventGraph::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<G> = Box<dyn GraphChangedListener<<G as PropertyGraph>::Vertex, <G as PropertyGraph>::Edge>>;
type Event<G> = GraphEvent<<G as PropertyGraph>::Vertex, <G as PropertyGraph>::Edge>;

pub struct EventGraph<G: PropertyGraph> {
    base: G,
    listeners: Vec<(ListenerId, Listener<G>)>,
    next_listener_id: u64,
    mode: DispatchMode,
    /// Events waiting for commit (deferred mode)
    pending: Vec<Event<G>>,
}

impl<G: PropertyGraph> EventGraph<G> {
    /// Wrap `base` with immediate dispatch
    pub fn new(base: G) -> Self {
        Self {
            base,
            listeners: Vec::new(),
            next_listener_id: 0,
            mode: DispatchMode::Immediate,
            pending: Vec::new(),
        }
    }

    /// Deferred dispatch needs a transactional base graph
    pub fn with_config(base: G, config: &EventConfig) -> GraphResult<Self> {
        if config.dispatch == DispatchMode::Deferred && !base.features().supports_transactions {
            return Err(GraphError::Config(
                "deferred event dispatch requires a transactional graph".to_string(),
            ));
        }
        let mut graph = Self::new(base);
        graph.mode = config.dispatch;
        Ok(graph)
    }

    pub fn add_listener<L>(&mut self, listener: L) -> ListenerId
    where
        L: GraphChangedListener<G::Vertex, G::Edge> + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the listener was not registered
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    pub fn base(&self) -> &G {
        &self.base
    }

    pub fn into_inner(self) -> G {
        self.base
    }

    fn on_event(&mut self, event: Event<G>) -> GraphResult<()> {
        match self.mode {
            DispatchMode::Immediate => self.dispatch(&event),
            DispatchMode::Deferred => {
                self.pending.push(event);
                Ok(())
            }
        }
    }

    fn dispatch(&mut self, event: &Event<G>) -> GraphResult<()> {
        trace!("Dispatching {} to {} listeners", event.kind(), self.listeners.len());
        for (id, listener) in self.listeners.iter_mut() {
            if let Err(err) = event.fire(listener.as_mut()) {
                warn!("Listener {:?} failed on {}: {}", id, event.kind(), err);
                return Err(GraphError::Listener {
                    element: event.element_id().clone(),
                    cause: err,
                });
            }
        }
        Ok(())
    }
}

impl<G: PropertyGraph> PropertyGraph for EventGraph<G> {
    type Vertex = G::Vertex;
    type Edge = G::Edge;

    fn features(&self) -> Features {
        self.base.features()
    }

    fn add_vertex(&mut self, id: Option<Id>) -> GraphResult<Self::Vertex> {
        let vertex = self.base.add_vertex(id)?;
        self.on_event(GraphEvent::VertexAdded {
            vertex: vertex.clone(),
        })?;
        Ok(vertex)
    }

    fn get_vertex(&self, id: &Id) -> GraphResult<Option<Self::Vertex>> {
        self.base.get_vertex(id)
    }

    fn remove_vertex(&mut self, vertex: &Self::Vertex) -> GraphResult<()> {
        let properties = self.base.vertex_properties(vertex)?;
        self.base.remove_vertex(vertex)?;
        self.on_event(GraphEvent::VertexRemoved {
            vertex: vertex.clone(),
            properties,
        })
    }

    fn vertices(&self) -> GraphResult<Vec<Self::Vertex>> {
        self.base.vertices()
    }

    fn vertices_with(&self, key: &str, value: &PropertyValue) -> GraphResult<Vec<Self::Vertex>> {
        self.base.vertices_with(key, value)
    }

    fn add_edge(
        &mut self,
        id: Option<Id>,
        tail: &Self::Vertex,
        head: &Self::Vertex,
        label: &str,
    ) -> GraphResult<Self::Edge> {
        let edge = self.base.add_edge(id, tail, head, label)?;
        self.on_event(GraphEvent::EdgeAdded { edge: edge.clone() })?;
        Ok(edge)
    }

    fn get_edge(&self, id: &Id) -> GraphResult<Option<Self::Edge>> {
        self.base.get_edge(id)
    }

    fn remove_edge(&mut self, edge: &Self::Edge) -> GraphResult<()> {
        let properties = self.base.edge_properties(edge)?;
        self.base.remove_edge(edge)?;
        self.on_event(GraphEvent::EdgeRemoved {
            edge: edge.clone(),
            properties,
        })
    }

    fn edges(&self) -> GraphResult<Vec<Self::Edge>> {
        self.base.edges()
    }

    fn edges_with(&self, key: &str, value: &PropertyValue) -> GraphResult<Vec<Self::Edge>> {
        self.base.edges_with(key, value)
    }

    fn edge_vertex(&self, edge: &Self::Edge, direction: Direction) -> GraphResult<Self::Vertex> {
        self.base.edge_vertex(edge, direction)
    }

    fn vertex_property(&self, vertex: &Self::Vertex, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.base.vertex_property(vertex, key)
    }

    fn set_vertex_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        let old_value = self.base.set_vertex_property(vertex, key, value.clone())?;
        self.on_event(GraphEvent::VertexPropertyChanged {
            vertex: vertex.clone(),
            key: key.to_string(),
            old_value: old_value.clone(),
            new_value: value,
        })?;
        Ok(old_value)
    }

    fn remove_vertex_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>> {
        let removed = self.base.remove_vertex_property(vertex, key)?;
        if let Some(value) = &removed {
            self.on_event(GraphEvent::VertexPropertyRemoved {
                vertex: vertex.clone(),
                key: key.to_string(),
                removed_value: value.clone(),
            })?;
        }
        Ok(removed)
    }

    fn vertex_property_keys(&self, vertex: &Self::Vertex) -> GraphResult<BTreeSet<String>> {
        self.base.vertex_property_keys(vertex)
    }

    fn edge_property(&self, edge: &Self::Edge, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.base.edge_property(edge, key)
    }

    fn set_edge_property(
        &mut self,
        edge: &Self::Edge,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        let old_value = self.base.set_edge_property(edge, key, value.clone())?;
        self.on_event(GraphEvent::EdgePropertyChanged {
            edge: edge.clone(),
            key: key.to_string(),
            old_value: old_value.clone(),
            new_value: value,
        })?;
        Ok(old_value)
    }

    fn remove_edge_property(&mut self, edge: &Self::Edge, key: &str) -> GraphResult<Option<PropertyValue>> {
        let removed = self.base.remove_edge_property(edge, key)?;
        if let Some(value) = &removed {
            self.on_event(GraphEvent::EdgePropertyRemoved {
                edge: edge.clone(),
                key: key.to_string(),
                removed_value: value.clone(),
            })?;
        }
        Ok(removed)
    }

    fn edge_property_keys(&self, edge: &Self::Edge) -> GraphResult<BTreeSet<String>> {
        self.base.edge_property_keys(edge)
    }

    fn vertex_edges(
        &self,
        vertex: &Self::Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Self::Edge>> {
        self.base.vertex_edges(vertex, direction, labels)
    }

    fn adjacent_vertices(
        &self,
        vertex: &Self::Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Self::Vertex>> {
        self.base.adjacent_vertices(vertex, direction, labels)
    }

    fn commit(&mut self) -> GraphResult<()> {
        self.base.commit()?;
        let pending = std::mem::take(&mut self.pending);
        for event in &pending {
            self.dispatch(event)?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> GraphResult<()> {
        self.base.rollback()?;
        if !self.pending.is_empty() {
            trace!("Discarding {} pending events", self.pending.len());
            self.pending.clear();
        }
        Ok(())
    }

    fn shutdown(&mut self) -> GraphResult<()> {
        self.base.shutdown()
    }
}
