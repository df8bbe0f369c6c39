//! Decorator configuration
//!
//! Plain serde structs with defaults, so a YAML file only has to name the
//! settings it changes:
//!
//! ```yaml
//! batch:
//!   compression: url
//!   buffer_size: 10000
//! events:
//!   dispatch: deferred
//! ```

use crate::graph::{GraphError, GraphResult};
use crate::ingest::compression::{Compression, IdentityCompression, UrlCompression};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Key compression used by the bulk-load cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionKind {
    #[default]
    Identity,
    /// Prefix-table compression for IRI-like IDs
    Url,
}

impl CompressionKind {
    pub fn build(self) -> Box<dyn Compression> {
        match self {
            CompressionKind::Identity => Box::new(IdentityCompression),
            CompressionKind::Url => Box::new(UrlCompression::new()),
        }
    }
}

/// Bulk-load decorator settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub compression: CompressionKind,
    /// Drive a transaction boundary after this many mutations (None = caller-driven)
    pub buffer_size: Option<u64>,
    /// Look for existing vertices in the wrapped graph on a cache miss
    pub incremental: bool,
    /// Also store each vertex's external ID under this property key
    pub vertex_id_key: Option<String>,
    /// Also store each edge's external ID under this property key
    pub edge_id_key: Option<String>,
}

impl BatchConfig {
    pub fn validate(&self) -> GraphResult<()> {
        if self.buffer_size == Some(0) {
            return Err(GraphError::Config("buffer_size must be positive".to_string()));
        }
        for key in [&self.vertex_id_key, &self.edge_id_key].into_iter().flatten() {
            if key.is_empty() || key == "id" || key == "label" {
                return Err(GraphError::Config(format!("invalid id property key: {:?}", key)));
            }
        }
        Ok(())
    }
}

/// When change events reach listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Right after each mutation
    #[default]
    Immediate,
    /// Queued until commit, dropped on rollback
    Deferred,
}

/// Change-notification decorator settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub dispatch: DispatchMode,
}

/// Settings for the whole decorator stack
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperConfig {
    pub batch: BatchConfig,
    pub events: EventConfig,
}

impl WrapperConfig {
    pub fn from_yaml_str(yaml: &str) -> GraphResult<Self> {
        let config: WrapperConfig =
            serde_yaml::from_str(yaml).map_err(|e| GraphError::Config(e.to_string()))?;
        config.batch.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> GraphResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }
}
