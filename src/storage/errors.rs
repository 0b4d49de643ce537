//! Shard store error types
//!
//! Error codes:
//! - CDN_STORE_FETCH (ERROR): any failed read, reported uniformly
//! - CDN_STORE_WRITE (FATAL during a build)
//! - CDN_STORE_INVALID_PATH (FATAL, configuration)

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
///
/// Fetch failures carry no status detail: a missing object, a permission
/// problem and a decode-level I/O error all look the same to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Failed to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Invalid store path '{0}'")]
    InvalidPath(String),
}

impl StoreError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Fetch { .. } => "CDN_STORE_FETCH",
            StoreError::Write { .. } => "CDN_STORE_WRITE",
            StoreError::InvalidPath(_) => "CDN_STORE_INVALID_PATH",
        }
    }

    pub(crate) fn fetch(path: &str, reason: impl ToString) -> Self {
        StoreError::Fetch {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: &str, reason: impl ToString) -> Self {
        StoreError::Write {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
