//! Cursor error types
//!
//! Error codes:
//! - CDN_CURSOR_CLOSED: operation on a finished cursor
//! - CDN_CURSOR_INVALID_LIMIT: page size of zero
//! - query codes pass through unchanged

use thiserror::Error;

use crate::schema::QueryError;

/// Result type for cursor operations
pub type CursorResult<T> = Result<T, CursorError>;

/// Cursor errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("Cursor {0} is closed")]
    Closed(String),

    #[error("Cursor limit must be greater than zero")]
    InvalidLimit,

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl CursorError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CursorError::Closed(_) => "CDN_CURSOR_CLOSED",
            CursorError::InvalidLimit => "CDN_CURSOR_INVALID_LIMIT",
            CursorError::Query(e) => e.code(),
        }
    }
}
