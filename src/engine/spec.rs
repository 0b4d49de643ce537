//! Declarative index specifications
//!
//! JSON form (camelCase, as found in build options and manifests):
//! ```json
//! { "id": "by-title", "column": "title", "type": "n-gram", "gramLen": 3, "toLowcase": true }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{EngineError, EngineResult};

/// The closed set of index engines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Exact-match lookup on field values
    #[default]
    Simple,
    /// Token n-gram substring lookup
    NGram,
    /// Lexical word lookup for full-text queries
    TextLex,
}

impl EngineKind {
    /// Map an engine-type tag to its engine
    pub fn from_tag(tag: &str) -> EngineResult<Self> {
        match tag {
            "simple" => Ok(EngineKind::Simple),
            "n-gram" => Ok(EngineKind::NGram),
            "text-lex" => Ok(EngineKind::TextLex),
            other => Err(EngineError::NotFound(other.to_string())),
        }
    }

    /// The engine-type tag
    pub fn tag(&self) -> &'static str {
        match self {
            EngineKind::Simple => "simple",
            EngineKind::NGram => "n-gram",
            EngineKind::TextLex => "text-lex",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One secondary index over one or more record fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSpec {
    /// Unique within a build; names the index's storage directory
    pub id: String,

    /// Single source field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    /// Multiple source fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,

    /// Engine-type tag; the build's default engine applies when absent
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,

    /// n-gram length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gram_len: Option<usize>,

    /// Case folding for n-gram keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_lowcase: Option<bool>,

    /// Minimum query length (in characters) before the index answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actuation_limit: Option<usize>,

    /// Use `gramLen` as the actuation limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actuation_limit_auto: Option<bool>,
}

impl IndexSpec {
    /// Spec over a single field
    pub fn single(id: impl Into<String>, column: impl Into<String>, kind: EngineKind) -> Self {
        Self {
            id: id.into(),
            column: Some(column.into()),
            columns: None,
            engine: Some(kind.tag().to_string()),
            gram_len: None,
            to_lowcase: None,
            actuation_limit: None,
            actuation_limit_auto: None,
        }
    }

    /// Spec over several fields
    pub fn multi(id: impl Into<String>, columns: &[&str], kind: EngineKind) -> Self {
        Self {
            column: None,
            columns: Some(columns.iter().map(|c| c.to_string()).collect()),
            ..Self::single(id, "", kind)
        }
    }

    /// Set the n-gram length
    pub fn with_gram_len(mut self, gram_len: usize) -> Self {
        self.gram_len = Some(gram_len);
        self
    }

    /// Set the actuation limit
    pub fn with_actuation_limit(mut self, limit: usize) -> Self {
        self.actuation_limit = Some(limit);
        self
    }

    /// Source field names, in declaration order
    pub fn fields(&self) -> Vec<&str> {
        match (&self.column, &self.columns) {
            (Some(column), _) => vec![column.as_str()],
            (None, Some(columns)) => columns.iter().map(String::as_str).collect(),
            (None, None) => Vec::new(),
        }
    }

    /// Resolve the engine, falling back to `default` when no tag is set
    pub fn engine_kind(&self, default: EngineKind) -> EngineResult<EngineKind> {
        match &self.engine {
            Some(tag) => EngineKind::from_tag(tag),
            None => Ok(default),
        }
    }

    /// Check structural invariants and the engine tag.
    ///
    /// Exactly one of `column` / `columns` must be set and non-empty.
    pub fn validate(&self, default: EngineKind) -> EngineResult<EngineKind> {
        if self.id.trim().is_empty() {
            return Err(EngineError::invalid(&self.id, "id must not be empty"));
        }

        match (&self.column, &self.columns) {
            (Some(_), Some(_)) => {
                return Err(EngineError::invalid(
                    &self.id,
                    "exactly one of column or columns may be set",
                ))
            }
            (None, None) => {
                return Err(EngineError::invalid(&self.id, "one of column or columns is required"))
            }
            (Some(column), None) if column.is_empty() => {
                return Err(EngineError::invalid(&self.id, "column must not be empty"))
            }
            (None, Some(columns)) if columns.is_empty() || columns.iter().any(String::is_empty) => {
                return Err(EngineError::invalid(&self.id, "columns must be non-empty names"))
            }
            _ => {}
        }

        if self.gram_len == Some(0) {
            return Err(EngineError::invalid(&self.id, "gramLen must be > 0"));
        }

        self.engine_kind(default)
    }

    /// A copy with the engine tag written out explicitly
    pub fn resolved(&self, default: EngineKind) -> EngineResult<IndexSpec> {
        let kind = self.validate(default)?;
        Ok(IndexSpec {
            engine: Some(kind.tag().to_string()),
            ..self.clone()
        })
    }

    /// Address under which queries reach this index.
    ///
    /// Single-field exact-match indices answer for the field name itself;
    /// every other index is addressed as `$<id>`.
    pub fn storage_path(&self) -> EngineResult<String> {
        let kind = self.engine_kind(EngineKind::Simple)?;
        match (&self.column, kind) {
            (Some(column), EngineKind::Simple) => Ok(column.clone()),
            _ => Ok(format!("${}", self.id)),
        }
    }
}
