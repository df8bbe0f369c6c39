//! The property-graph capability contract
//!
//! Every base graph and every decorator implements [`PropertyGraph`], which is
//! what lets decorators stack: a decorator holds the graph it wraps, forwards
//! the operations it does not care about and intercepts the rest.
//!
//! Elements are handles. All reads and writes go through the owning graph so
//! that a decorator sees every mutation without having to wrap element
//! methods individually.

use super::error::{GraphError, GraphResult};
use super::property::{PropertyMap, PropertyValue};
use super::query::VertexQuery;
use super::types::{Direction, Id};
use std::collections::BTreeSet;
use std::fmt;

/// A vertex or edge handle
pub trait Element: Clone + fmt::Debug {
    fn id(&self) -> &Id;
}

/// An edge handle; the label is fixed at creation
pub trait EdgeElement: Element {
    fn label(&self) -> &str;
}

/// Capabilities of a graph, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    /// `add_vertex(Some(id))` creates the vertex under `id`
    pub supports_vertex_ids: bool,
    /// `add_edge(Some(id), ..)` creates the edge under `id`
    pub supports_edge_ids: bool,
    /// `commit`/`rollback` are available
    pub supports_transactions: bool,
}

pub trait PropertyGraph {
    type Vertex: Element;
    type Edge: EdgeElement;

    fn features(&self) -> Features;

    /// Create a vertex. Graphs that do not support caller-chosen IDs ignore
    /// `id` and mint their own.
    fn add_vertex(&mut self, id: Option<Id>) -> GraphResult<Self::Vertex>;

    fn get_vertex(&self, id: &Id) -> GraphResult<Option<Self::Vertex>>;

    /// Remove a vertex together with its incident edges
    fn remove_vertex(&mut self, vertex: &Self::Vertex) -> GraphResult<()>;

    fn vertices(&self) -> GraphResult<Vec<Self::Vertex>>;

    fn vertices_with(&self, key: &str, value: &PropertyValue) -> GraphResult<Vec<Self::Vertex>> {
        let mut matches = Vec::new();
        for vertex in self.vertices()? {
            if self.vertex_property(&vertex, key)?.as_ref() == Some(value) {
                matches.push(vertex);
            }
        }
        Ok(matches)
    }

    fn add_edge(
        &mut self,
        id: Option<Id>,
        tail: &Self::Vertex,
        head: &Self::Vertex,
        label: &str,
    ) -> GraphResult<Self::Edge>;

    fn get_edge(&self, id: &Id) -> GraphResult<Option<Self::Edge>>;

    fn remove_edge(&mut self, edge: &Self::Edge) -> GraphResult<()>;

    fn edges(&self) -> GraphResult<Vec<Self::Edge>>;

    fn edges_with(&self, key: &str, value: &PropertyValue) -> GraphResult<Vec<Self::Edge>> {
        let mut matches = Vec::new();
        for edge in self.edges()? {
            if self.edge_property(&edge, key)?.as_ref() == Some(value) {
                matches.push(edge);
            }
        }
        Ok(matches)
    }

    /// `Out` yields the tail, `In` the head
    fn edge_vertex(&self, edge: &Self::Edge, direction: Direction) -> GraphResult<Self::Vertex>;

    fn vertex_property(&self, vertex: &Self::Vertex, key: &str) -> GraphResult<Option<PropertyValue>>;

    /// Returns the previous value, if any
    fn set_vertex_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>>;

    fn remove_vertex_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>>;

    fn vertex_property_keys(&self, vertex: &Self::Vertex) -> GraphResult<BTreeSet<String>>;

    fn edge_property(&self, edge: &Self::Edge, key: &str) -> GraphResult<Option<PropertyValue>>;

    fn set_edge_property(
        &mut self,
        edge: &Self::Edge,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>>;

    fn remove_edge_property(&mut self, edge: &Self::Edge, key: &str) -> GraphResult<Option<PropertyValue>>;

    fn edge_property_keys(&self, edge: &Self::Edge) -> GraphResult<BTreeSet<String>>;

    /// Edges incident to `vertex`; an empty label slice matches every label
    fn vertex_edges(
        &self,
        vertex: &Self::Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Self::Edge>>;

    fn adjacent_vertices(
        &self,
        vertex: &Self::Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Self::Vertex>> {
        let mut adjacent = Vec::new();
        match direction {
            Direction::Out | Direction::In => {
                for edge in self.vertex_edges(vertex, direction, labels)? {
                    adjacent.push(self.edge_vertex(&edge, direction.opposite())?);
                }
            }
            Direction::Both => {
                adjacent.extend(self.adjacent_vertices(vertex, Direction::Out, labels)?);
                adjacent.extend(self.adjacent_vertices(vertex, Direction::In, labels)?);
            }
        }
        Ok(adjacent)
    }

    /// Start a filtered traversal from `vertex`
    fn query(&self, vertex: &Self::Vertex) -> VertexQuery<Self::Vertex> {
        VertexQuery::new(vertex.clone())
    }

    /// Snapshot of every property on a vertex
    fn vertex_properties(&self, vertex: &Self::Vertex) -> GraphResult<PropertyMap> {
        let mut properties = PropertyMap::new();
        for key in self.vertex_property_keys(vertex)? {
            if let Some(value) = self.vertex_property(vertex, &key)? {
                properties.insert(key, value);
            }
        }
        Ok(properties)
    }

    fn edge_properties(&self, edge: &Self::Edge) -> GraphResult<PropertyMap> {
        let mut properties = PropertyMap::new();
        for key in self.edge_property_keys(edge)? {
            if let Some(value) = self.edge_property(edge, &key)? {
                properties.insert(key, value);
            }
        }
        Ok(properties)
    }

    fn commit(&mut self) -> GraphResult<()> {
        Err(GraphError::UnsupportedOperation("commit"))
    }

    fn rollback(&mut self) -> GraphResult<()> {
        Err(GraphError::UnsupportedOperation("rollback"))
    }

    fn shutdown(&mut self) -> GraphResult<()> {
        Ok(())
    }
}

/// Decorators are generic over the graph they wrap; wrapping `&mut G`
/// leaves ownership of the base graph with the caller.
impl<G: PropertyGraph + ?Sized> PropertyGraph for &mut G {
    type Vertex = G::Vertex;
    type Edge = G::Edge;

    fn features(&self) -> Features {
        (**self).features()
    }

    fn add_vertex(&mut self, id: Option<Id>) -> GraphResult<Self::Vertex> {
        (**self).add_vertex(id)
    }

    fn get_vertex(&self, id: &Id) -> GraphResult<Option<Self::Vertex>> {
        (**self).get_vertex(id)
    }

    fn remove_vertex(&mut self, vertex: &Self::Vertex) -> GraphResult<()> {
        (**self).remove_vertex(vertex)
    }

    fn vertices(&self) -> GraphResult<Vec<Self::Vertex>> {
        (**self).vertices()
    }

    fn vertices_with(&self, key: &str, value: &PropertyValue) -> GraphResult<Vec<Self::Vertex>> {
        (**self).vertices_with(key, value)
    }

    fn add_edge(
        &mut self,
        id: Option<Id>,
        tail: &Self::Vertex,
        head: &Self::Vertex,
        label: &str,
    ) -> GraphResult<Self::Edge> {
        (**self).add_edge(id, tail, head, label)
    }

    fn get_edge(&self, id: &Id) -> GraphResult<Option<Self::Edge>> {
        (**self).get_edge(id)
    }

    fn remove_edge(&mut self, edge: &Self::Edge) -> GraphResult<()> {
        (**self).remove_edge(edge)
    }

    fn edges(&self) -> GraphResult<Vec<Self::Edge>> {
        (**self).edges()
    }

    fn edges_with(&self, key: &str, value: &PropertyValue) -> GraphResult<Vec<Self::Edge>> {
        (**self).edges_with(key, value)
    }

    fn edge_vertex(&self, edge: &Self::Edge, direction: Direction) -> GraphResult<Self::Vertex> {
        (**self).edge_vertex(edge, direction)
    }

    fn vertex_property(&self, vertex: &Self::Vertex, key: &str) -> GraphResult<Option<PropertyValue>> {
        (**self).vertex_property(vertex, key)
    }

    fn set_vertex_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        (**self).set_vertex_property(vertex, key, value)
    }

    fn remove_vertex_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>> {
        (**self).remove_vertex_property(vertex, key)
    }

    fn vertex_property_keys(&self, vertex: &Self::Vertex) -> GraphResult<BTreeSet<String>> {
        (**self).vertex_property_keys(vertex)
    }

    fn edge_property(&self, edge: &Self::Edge, key: &str) -> GraphResult<Option<PropertyValue>> {
        (**self).edge_property(edge, key)
    }

    fn set_edge_property(
        &mut self,
        edge: &Self::Edge,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<Option<PropertyValue>> {
        (**self).set_edge_property(edge, key, value)
    }

    fn remove_edge_property(&mut self, edge: &Self::Edge, key: &str) -> GraphResult<Option<PropertyValue>> {
        (**self).remove_edge_property(edge, key)
    }

    fn edge_property_keys(&self, edge: &Self::Edge) -> GraphResult<BTreeSet<String>> {
        (**self).edge_property_keys(edge)
    }

    fn vertex_edges(
        &self,
        vertex: &Self::Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Self::Edge>> {
        (**self).vertex_edges(vertex, direction, labels)
    }

    fn adjacent_vertices(
        &self,
        vertex: &Self::Vertex,
        direction: Direction,
        labels: &[&str],
    ) -> GraphResult<Vec<Self::Vertex>> {
        (**self).adjacent_vertices(vertex, direction, labels)
    }

    fn commit(&mut self) -> GraphResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> GraphResult<()> {
        (**self).rollback()
    }

    fn shutdown(&mut self) -> GraphResult<()> {
        (**self).shutdown()
    }
}
