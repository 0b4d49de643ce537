//! CLI-specific error types
//!
//! Subsystem errors keep their own `CDN_*` code when they reach the CLI.

use std::fmt;
use std::io;

use crate::build::BuildError;
use crate::cursor::CursorError;
use crate::schema::{QueryError, RestoreError};

/// Codes for failures that originate in the CLI itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Bad argument value
    InvalidArgument,
    /// I/O error (stdout, runtime)
    IoError,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "CDN_CLI_INVALID_ARGUMENT",
            Self::IoError => "CDN_CLI_IO_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: &'static str,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidArgument, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Error code string
    pub fn code_str(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn from_code(code: &'static str, message: String) -> Self {
        Self { code, message }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<BuildError> for CliError {
    fn from(e: BuildError) -> Self {
        Self::from_code(e.code(), e.to_string())
    }
}

impl From<RestoreError> for CliError {
    fn from(e: RestoreError) -> Self {
        Self::from_code(e.code(), e.to_string())
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        Self::from_code(e.code(), e.to_string())
    }
}

impl From<CursorError> for CliError {
    fn from(e: CursorError) -> Self {
        Self::from_code(e.code(), e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
