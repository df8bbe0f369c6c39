//! Change notification
//!
//! `EventGraph` wraps any graph and reports every structural or property
//! mutation to an ordered list of listeners.

pub mod events;
pub mod graph;
pub mod listener;

pub use events::GraphEvent;
pub use graph::{EventGraph, ListenerId};
pub use listener::{GraphChangedListener, LoggingListener};
