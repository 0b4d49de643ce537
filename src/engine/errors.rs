//! Engine error types
//!
//! Error codes:
//! - CDN_ENGINE_NOT_FOUND (FATAL at build and restore)
//! - CDN_ENGINE_INVALID_SPEC (FATAL, configuration)

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Engine {0} not found")]
    NotFound(String),

    #[error("Invalid index spec '{id}': {reason}")]
    InvalidSpec { id: String, reason: String },
}

impl EngineError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "CDN_ENGINE_NOT_FOUND",
            EngineError::InvalidSpec { .. } => "CDN_ENGINE_INVALID_SPEC",
        }
    }

    pub(crate) fn invalid(id: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidSpec {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(EngineError::NotFound("fuzzy".into()).code(), "CDN_ENGINE_NOT_FOUND");
        assert_eq!(EngineError::invalid("x", "bad").code(), "CDN_ENGINE_INVALID_SPEC");
    }

    #[test]
    fn test_not_found_display() {
        let err = EngineError::NotFound("fuzzy".into());
        assert_eq!(err.to_string(), "Engine fuzzy not found");
    }
}
