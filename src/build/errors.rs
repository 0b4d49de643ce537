//! Build error types
//!
//! Error codes:
//! - CDN_BUILD_SOURCE: record source reported errors
//! - CDN_BUILD_CONFIG: missing or invalid build configuration
//! - CDN_BUILD_RECORD: a record lacks a valid, unique identifier
//! - CDN_BUILD_NORMALIZE: normalizer rejected the source payload
//! - CDN_BUILD_LEDGER: build ledger unreadable or unwritable
//! - engine, codec and store codes pass through unchanged
//!
//! Every build error is fatal: a build either completes with its manifest
//! written last, or fails without one.

use thiserror::Error;

use crate::codec::CodecError;
use crate::engine::EngineError;
use crate::storage::StoreError;

/// Result type for build operations
pub type BuildResult<T> = Result<T, BuildError>;

/// Build errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Record source reported {count} error(s); first: {first}")]
    Source { count: usize, first: String },

    #[error("Invalid build configuration: {0}")]
    Config(String),

    #[error("Record #{position}: {reason}")]
    Record { position: usize, reason: String },

    #[error("Failed to normalize source results: {0}")]
    Normalize(String),

    #[error("Build ledger {path}: {reason}")]
    Ledger { path: String, reason: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BuildError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            BuildError::Source { .. } => "CDN_BUILD_SOURCE",
            BuildError::Config(_) => "CDN_BUILD_CONFIG",
            BuildError::Record { .. } => "CDN_BUILD_RECORD",
            BuildError::Normalize(_) => "CDN_BUILD_NORMALIZE",
            BuildError::Ledger { .. } => "CDN_BUILD_LEDGER",
            BuildError::Engine(e) => e.code(),
            BuildError::Codec(e) => e.code(),
            BuildError::Store(e) => e.code(),
        }
    }

    /// Build errors are never recovered locally
    pub fn is_fatal(&self) -> bool {
        true
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        BuildError::Config(message.into())
    }

    pub(crate) fn record(position: usize, reason: impl Into<String>) -> Self {
        BuildError::Record {
            position,
            reason: reason.into(),
        }
    }

    pub(crate) fn ledger(path: &std::path::Path, reason: impl ToString) -> Self {
        BuildError::Ledger {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
