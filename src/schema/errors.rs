//! Restore and query error types
//!
//! Error codes:
//! - CDN_RESTORE_MANIFEST: manifest missing or unparseable
//! - CDN_RESTORE_INDEX: an index's shard table or primary shards unavailable
//! - CDN_QUERY_INVALID: malformed query or sort
//! - CDN_QUERY_UNSUPPORTED: condition the addressed index cannot answer
//! - CDN_QUERY_NO_TEXT_INDEX: full-text query without a text-lex index
//! - CDN_QUERY_SHARD: a lazy shard failed to load during a query
//! - engine codes pass through unchanged

use thiserror::Error;

use crate::codec::CodecError;
use crate::engine::EngineError;

/// Result type for restore operations
pub type RestoreResult<T> = Result<T, RestoreError>;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Query-time restoration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    #[error("Failed to restore manifest of build '{build_id}': {reason}")]
    Manifest { build_id: String, reason: String },

    #[error("Failed to restore index '{index_id}': {reason}")]
    IndexRestore { index_id: String, reason: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl RestoreError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RestoreError::Manifest { .. } => "CDN_RESTORE_MANIFEST",
            RestoreError::IndexRestore { .. } => "CDN_RESTORE_INDEX",
            RestoreError::Engine(e) => e.code(),
        }
    }

    /// Unknown engines cannot be fixed by retrying; fetch failures can
    pub fn is_fatal(&self) -> bool {
        matches!(self, RestoreError::Engine(_))
    }

    pub(crate) fn manifest(build_id: &str, reason: impl ToString) -> Self {
        RestoreError::Manifest {
            build_id: build_id.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn index(index_id: &str, reason: impl ToString) -> Self {
        RestoreError::IndexRestore {
            index_id: index_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Query errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid query: {0}")]
    Invalid(String),

    #[error("Index at '{path}' cannot answer {op}")]
    Unsupported { path: String, op: String },

    #[error("No text-lex index in this build")]
    NoTextIndex,

    #[error("Failed to load shard of index '{index_id}': {source}")]
    Shard {
        index_id: String,
        #[source]
        source: CodecError,
    },
}

impl QueryError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Invalid(_) => "CDN_QUERY_INVALID",
            QueryError::Unsupported { .. } => "CDN_QUERY_UNSUPPORTED",
            QueryError::NoTextIndex => "CDN_QUERY_NO_TEXT_INDEX",
            QueryError::Shard { .. } => "CDN_QUERY_SHARD",
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        QueryError::Invalid(message.into())
    }

    pub(crate) fn shard(index_id: &str, source: CodecError) -> Self {
        QueryError::Shard {
            index_id: index_id.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;

    #[test]
    fn test_restore_codes() {
        assert_eq!(RestoreError::manifest("b1", "gone").code(), "CDN_RESTORE_MANIFEST");
        assert_eq!(RestoreError::index("by-name", "gone").code(), "CDN_RESTORE_INDEX");
        assert!(!RestoreError::index("by-name", "gone").is_fatal());
        assert!(RestoreError::from(EngineError::NotFound("x".into())).is_fatal());
    }

    #[test]
    fn test_shard_error_display() {
        let err = QueryError::shard(
            "by-name",
            CodecError::Store(StoreError::fetch("b1/by-name/0.json", "gone")),
        );
        assert_eq!(err.code(), "CDN_QUERY_SHARD");
        assert_eq!(
            err.to_string(),
            "Failed to load shard of index 'by-name': Failed to fetch b1/by-name/0.json: gone"
        );
    }
}
