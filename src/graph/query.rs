//! Filtered traversal builder
//!
//! A `VertexQuery` is started from a vertex with [`PropertyGraph::query`] and
//! executed against a graph. Execution only uses the traversal and property
//! primitives of the contract, so a query run through a decorator returns
//! decorated elements.

use super::error::GraphResult;
use super::property::PropertyValue;
use super::traits::PropertyGraph;
use super::types::Direction;

#[derive(Debug, Clone)]
pub struct VertexQuery<V> {
    vertex: V,
    direction: Direction,
    labels: Vec<String>,
    has: Vec<(String, PropertyValue)>,
    limit: Option<usize>,
}

impl<V: Clone> VertexQuery<V> {
    pub fn new(vertex: V) -> Self {
        Self {
            vertex,
            direction: Direction::Both,
            labels: Vec::new(),
            has: Vec::new(),
            limit: None,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Keep only edges whose property `key` equals `value`
    pub fn has(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.has.push((key.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Matching edges, in the order the graph reports them
    pub fn edges<G>(&self, graph: &G) -> GraphResult<Vec<G::Edge>>
    where
        G: PropertyGraph<Vertex = V> + ?Sized,
    {
        let labels: Vec<&str> = self.labels.iter().map(String::as_str).collect();
        let limit = self.limit.unwrap_or(usize::MAX);
        let mut result = Vec::new();

        for edge in graph.vertex_edges(&self.vertex, self.direction, &labels)? {
            if result.len() >= limit {
                break;
            }
            if self.matches(graph, &edge)? {
                result.push(edge);
            }
        }
        Ok(result)
    }

    /// Vertices at the other end of the matching edges
    pub fn vertices<G>(&self, graph: &G) -> GraphResult<Vec<G::Vertex>>
    where
        G: PropertyGraph<Vertex = V> + ?Sized,
    {
        let mut result = Vec::new();
        for direction in self.expanded_directions() {
            let remaining = self.limit.map(|l| l.saturating_sub(result.len()));
            if remaining == Some(0) {
                break;
            }
            let mut step = self.clone().direction(direction);
            step.limit = remaining;
            for edge in step.edges(graph)? {
                result.push(graph.edge_vertex(&edge, direction.opposite())?);
            }
        }
        Ok(result)
    }

    pub fn count<G>(&self, graph: &G) -> GraphResult<usize>
    where
        G: PropertyGraph<Vertex = V> + ?Sized,
    {
        Ok(self.edges(graph)?.len())
    }

    fn expanded_directions(&self) -> Vec<Direction> {
        match self.direction {
            Direction::Both => vec![Direction::Out, Direction::In],
            d => vec![d],
        }
    }

    fn matches<G>(&self, graph: &G, edge: &G::Edge) -> GraphResult<bool>
    where
        G: PropertyGraph<Vertex = V> + ?Sized,
    {
        for (key, expected) in &self.has {
            if graph.edge_property(edge, key)?.as_ref() != Some(expected) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
