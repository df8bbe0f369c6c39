//! Change listeners
//!
//! Every handler defaults to a no-op, so a listener only implements the
//! events it cares about. A handler error stops dispatch of that event.

use crate::graph::{EdgeElement, Element, PropertyMap, PropertyValue};
use tracing::info;

pub trait GraphChangedListener<V, E> {
    fn vertex_added(&mut self, _vertex: &V) -> anyhow::Result<()> {
        Ok(())
    }

    fn vertex_removed(&mut self, _vertex: &V, _properties: &PropertyMap) -> anyhow::Result<()> {
        Ok(())
    }

    fn edge_added(&mut self, _edge: &E) -> anyhow::Result<()> {
        Ok(())
    }

    fn edge_removed(&mut self, _edge: &E, _properties: &PropertyMap) -> anyhow::Result<()> {
        Ok(())
    }

    fn vertex_property_changed(
        &mut self,
        _vertex: &V,
        _key: &str,
        _old_value: Option<&PropertyValue>,
        _new_value: &PropertyValue,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn vertex_property_removed(
        &mut self,
        _vertex: &V,
        _key: &str,
        _removed_value: &PropertyValue,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn edge_property_changed(
        &mut self,
        _edge: &E,
        _key: &str,
        _old_value: Option<&PropertyValue>,
        _new_value: &PropertyValue,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn edge_property_removed(
        &mut self,
        _edge: &E,
        _key: &str,
        _removed_value: &PropertyValue,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Logs every event at `info` level
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

impl<V: Element, E: EdgeElement> GraphChangedListener<V, E> for LoggingListener {
    fn vertex_added(&mut self, vertex: &V) -> anyhow::Result<()> {
        info!("vertex {} added", vertex.id());
        Ok(())
    }

    fn vertex_removed(&mut self, vertex: &V, properties: &PropertyMap) -> anyhow::Result<()> {
        info!("vertex {} removed with {} properties", vertex.id(), properties.len());
        Ok(())
    }

    fn edge_added(&mut self, edge: &E) -> anyhow::Result<()> {
        info!("edge {} ({}) added", edge.id(), edge.label());
        Ok(())
    }

    fn edge_removed(&mut self, edge: &E, properties: &PropertyMap) -> anyhow::Result<()> {
        info!(
            "edge {} ({}) removed with {} properties",
            edge.id(),
            edge.label(),
            properties.len()
        );
        Ok(())
    }

    fn vertex_property_changed(
        &mut self,
        vertex: &V,
        key: &str,
        old_value: Option<&PropertyValue>,
        new_value: &PropertyValue,
    ) -> anyhow::Result<()> {
        match old_value {
            Some(old) => info!("vertex {} property {}: {} -> {}", vertex.id(), key, old, new_value),
            None => info!("vertex {} property {} set to {}", vertex.id(), key, new_value),
        }
        Ok(())
    }

    fn vertex_property_removed(
        &mut self,
        vertex: &V,
        key: &str,
        removed_value: &PropertyValue,
    ) -> anyhow::Result<()> {
        info!("vertex {} property {} removed (was {})", vertex.id(), key, removed_value);
        Ok(())
    }

    fn edge_property_changed(
        &mut self,
        edge: &E,
        key: &str,
        old_value: Option<&PropertyValue>,
        new_value: &PropertyValue,
    ) -> anyhow::Result<()> {
        match old_value {
            Some(old) => info!("edge {} property {}: {} -> {}", edge.id(), key, old, new_value),
            None => info!("edge {} property {} set to {}", edge.id(), key, new_value),
        }
        Ok(())
    }

    fn edge_property_removed(
        &mut self,
        edge: &E,
        key: &str,
        removed_value: &PropertyValue,
    ) -> anyhow::Result<()> {
        info!("edge {} property {} removed (was {})", edge.id(), key, removed_value);
        Ok(())
    }
}
