//! Chunk codec error types
//!
//! Error codes:
//! - CDN_CODEC_CHUNK_SIZE (FATAL, configuration)
//! - CDN_CODEC_ENCODE (FATAL)
//! - CDN_CODEC_DECODE (ERROR)
//! - CDN_CODEC_CHECKSUM (ERROR, corrupted or mixed-build shard)
//! - store codes pass through unchanged

use thiserror::Error;

use crate::storage::StoreError;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Chunk size for index '{0}' must be greater than zero")]
    InvalidChunkSize(String),

    #[error("Failed to encode {path}: {reason}")]
    Encode { path: String, reason: String },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CodecError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::InvalidChunkSize(_) => "CDN_CODEC_CHUNK_SIZE",
            CodecError::Encode { .. } => "CDN_CODEC_ENCODE",
            CodecError::Decode { .. } => "CDN_CODEC_DECODE",
            CodecError::ChecksumMismatch { .. } => "CDN_CODEC_CHECKSUM",
            CodecError::Store(e) => e.code(),
        }
    }

    pub(crate) fn encode(path: &str, reason: impl ToString) -> Self {
        CodecError::Encode {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(path: &str, reason: impl ToString) -> Self {
        CodecError::Decode {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
