//! Build options
//!
//! Loaded from a JSON options file:
//! ```json
//! {
//!   "id": "posts",
//!   "idAttr": "id",
//!   "graphQL": "{ allPosts { nodes { id title } } }",
//!   "engine": { "type": "simple" },
//!   "chunkSize": 50,
//!   "dataChunkSize": 25,
//!   "normalizer": { "pointer": "/allPosts/nodes" },
//!   "dataAttrs": ["title"],
//!   "indices": [{ "id": "by-title", "column": "title", "type": "n-gram" }]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::errors::{BuildError, BuildResult};
use crate::engine::{EngineKind, IndexSpec};
use crate::record::Normalizer;
use crate::storage::{primary_index_id, validate_segment};

/// Default secondary-index shard size
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Default primary-index shard size
pub const DEFAULT_DATA_CHUNK_SIZE: usize = 25;

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_data_chunk_size() -> usize {
    DEFAULT_DATA_CHUNK_SIZE
}

/// Default engine for specs without a `type`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSelector {
    #[serde(rename = "type")]
    pub engine: String,
}

/// Options of one build
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    /// Build identifier; names the build directory
    pub id: String,

    #[serde(default)]
    pub site_url: Option<String>,

    /// Query handed to the record source
    #[serde(rename = "graphQL", default)]
    pub graphql: Option<String>,

    #[serde(default)]
    pub engine: Option<EngineSelector>,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_data_chunk_size")]
    pub data_chunk_size: usize,

    #[serde(default)]
    pub normalizer: Option<Normalizer>,

    /// Identifier field of every record
    pub id_attr: String,

    /// Fields kept in the primary index besides the identifier; all when empty
    #[serde(default)]
    pub data_attrs: Vec<String>,

    #[serde(default)]
    pub indices: Vec<IndexSpec>,
}

impl BuildOptions {
    pub fn new(id: impl Into<String>, id_attr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            site_url: None,
            graphql: None,
            engine: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            data_chunk_size: DEFAULT_DATA_CHUNK_SIZE,
            normalizer: None,
            id_attr: id_attr.into(),
            data_attrs: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn with_index(mut self, spec: IndexSpec) -> Self {
        self.indices.push(spec);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_data_chunk_size(mut self, data_chunk_size: usize) -> Self {
        self.data_chunk_size = data_chunk_size;
        self
    }

    pub fn with_data_attrs(mut self, attrs: &[&str]) -> Self {
        self.data_attrs = attrs.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_default_engine(mut self, kind: EngineKind) -> Self {
        self.engine = Some(EngineSelector {
            engine: kind.tag().to_string(),
        });
        self
    }

    /// Load options from a JSON file
    pub fn load(path: &Path) -> BuildResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BuildError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            BuildError::config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Engine applied to specs without a `type`
    pub fn default_engine(&self) -> BuildResult<EngineKind> {
        match &self.engine {
            Some(selector) => Ok(EngineKind::from_tag(&selector.engine)?),
            None => Ok(EngineKind::Simple),
        }
    }

    /// Query string handed to the record source
    pub fn query(&self) -> &str {
        self.graphql.as_deref().unwrap_or("")
    }

    pub fn primary_index_id(&self) -> String {
        primary_index_id(&self.id)
    }

    /// Check the whole configuration before anything is fetched or written.
    ///
    /// Unknown engine tags fail here, not at first use.
    pub fn validate(&self) -> BuildResult<()> {
        validate_segment(&self.id)
            .map_err(|_| BuildError::config(format!("id '{}' is not a valid build id", self.id)))?;

        if self.id_attr.is_empty() {
            return Err(BuildError::config("idAttr is required"));
        }
        if self.chunk_size == 0 {
            return Err(BuildError::config("chunkSize must be greater than zero"));
        }
        if self.data_chunk_size == 0 {
            return Err(BuildError::config("dataChunkSize must be greater than zero"));
        }
        if self.normalizer.is_none() {
            return Err(BuildError::config("a normalizer is required"));
        }

        let default = self.default_engine()?;
        let primary = self.primary_index_id();
        let mut seen = HashSet::new();

        for spec in &self.indices {
            spec.validate(default)?;

            validate_segment(&spec.id).map_err(|_| {
                BuildError::config(format!("index id '{}' is not a valid path segment", spec.id))
            })?;
            if spec.id == primary || spec.id == format!("indices.{}.json", self.id) {
                return Err(BuildError::config(format!(
                    "index id '{}' collides with a build artifact",
                    spec.id
                )));
            }
            if !seen.insert(spec.id.as_str()) {
                return Err(BuildError::config(format!("duplicate index id '{}'", spec.id)));
            }
        }

        Ok(())
    }
}
