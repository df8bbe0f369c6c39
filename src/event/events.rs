//! Immutable mutation events
//!
//! Each event is a snapshot taken when the mutation happened. Removal events
//! carry a copy of the element's properties because the element itself is
//! gone by the time listeners see it.

use super::listener::GraphChangedListener;
use crate::graph::{Element, Id, PropertyMap, PropertyValue};

#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent<V, E> {
    VertexAdded {
        vertex: V,
    },
    VertexRemoved {
        vertex: V,
        properties: PropertyMap,
    },
    EdgeAdded {
        edge: E,
    },
    EdgeRemoved {
        edge: E,
        properties: PropertyMap,
    },
    VertexPropertyChanged {
        vertex: V,
        key: String,
        old_value: Option<PropertyValue>,
        new_value: PropertyValue,
    },
    VertexPropertyRemoved {
        vertex: V,
        key: String,
        removed_value: PropertyValue,
    },
    EdgePropertyChanged {
        edge: E,
        key: String,
        old_value: Option<PropertyValue>,
        new_value: PropertyValue,
    },
    EdgePropertyRemoved {
        edge: E,
        key: String,
        removed_value: PropertyValue,
    },
}

impl<V, E> GraphEvent<V, E> {
    /// Route this event to the matching handler of `listener`
    pub fn fire(&self, listener: &mut dyn GraphChangedListener<V, E>) -> anyhow::Result<()> {
        use GraphEvent::*;

        match self {
            VertexAdded { vertex } => listener.vertex_added(vertex),
            VertexRemoved { vertex, properties } => listener.vertex_removed(vertex, properties),
            EdgeAdded { edge } => listener.edge_added(edge),
            EdgeRemoved { edge, properties } => listener.edge_removed(edge, properties),
            VertexPropertyChanged {
                vertex,
                key,
                old_value,
                new_value,
            } => listener.vertex_property_changed(vertex, key, old_value.as_ref(), new_value),
            VertexPropertyRemoved {
                vertex,
                key,
                removed_value,
            } => listener.vertex_property_removed(vertex, key, removed_value),
            EdgePropertyChanged {
                edge,
                key,
                old_value,
                new_value,
            } => listener.edge_property_changed(edge, key, old_value.as_ref(), new_value),
            EdgePropertyRemoved {
                edge,
                key,
                removed_value,
            } => listener.edge_property_removed(edge, key, removed_value),
        }
    }

    /// ID of the vertex or edge the event is about
    pub fn element_id(&self) -> &Id
    where
        V: Element,
        E: Element,
    {
        use GraphEvent::*;

        match self {
            VertexAdded { vertex }
            | VertexRemoved { vertex, .. }
            | VertexPropertyChanged { vertex, .. }
            | VertexPropertyRemoved { vertex, .. } => vertex.id(),
            EdgeAdded { edge }
            | EdgeRemoved { edge, .. }
            | EdgePropertyChanged { edge, .. }
            | EdgePropertyRemoved { edge, .. } => edge.id(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GraphEvent::VertexAdded { .. } => "vertex_added",
            GraphEvent::VertexRemoved { .. } => "vertex_removed",
            GraphEvent::EdgeAdded { .. } => "edge_added",
            GraphEvent::EdgeRemoved { .. } => "edge_removed",
            GraphEvent::VertexPropertyChanged { .. } => "vertex_property_changed",
            GraphEvent::VertexPropertyRemoved { .. } => "vertex_property_removed",
            GraphEvent::EdgePropertyChanged { .. } => "edge_property_changed",
            GraphEvent::EdgePropertyRemoved { .. } => "edge_property_removed",
        }
    }
}
