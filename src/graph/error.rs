//! Errors surfaced by graphs and graph decorators

use super::types::Id;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug)]
pub enum GraphError {
    /// A caller-supplied ID is already in use
    #[error("Element with id {0} already exists")]
    DuplicateIdentifier(Id),

    #[error("Vertex {0} not found")]
    VertexNotFound(Id),

    #[error("Edge {0} not found")]
    EdgeNotFound(Id),

    /// Handle was produced in a transaction that has since ended
    #[error("Handle for element {0} is no longer valid in the current transaction")]
    StaleHandle(Id),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A change listener failed while handling an event. The mutation on
    /// `element` was applied before dispatch and is kept.
    #[error("Listener failed on element {element}: {cause}")]
    Listener { element: Id, cause: anyhow::Error },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Property keys every graph refuses to store
pub(crate) fn validate_property_key(key: &str) -> GraphResult<()> {
    match key {
        "" => Err(GraphError::InvalidArgument("property key can not be empty".to_string())),
        "id" | "label" => Err(GraphError::InvalidArgument(format!(
            "property key is reserved for all elements: {}",
            key
        ))),
        _ => Ok(()),
    }
}
