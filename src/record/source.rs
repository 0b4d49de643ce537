//! Record sources
//!
//! A record source answers a query string (for a GraphQL layer, the query
//! document) with a JSON payload and a list of errors. The build only
//! inspects `errors` and hands `data` to the normalizer.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw answer of a record source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceResponse {
    /// Payload handed to the normalizer
    #[serde(default)]
    pub data: Value,
    /// Errors reported by the source; any entry aborts the build
    #[serde(default)]
    pub errors: Vec<Value>,
}

impl SourceResponse {
    /// A successful response
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// A failed response carrying one error message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            data: Value::Null,
            errors: vec![Value::String(message.into())],
        }
    }

    /// Returns true if the source reported errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// External collaborator supplying raw records
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Run `query` against the source
    async fn query(&self, query: &str) -> SourceResponse;
}

/// A source answering every query with the same payload
#[derive(Debug, Clone)]
pub struct StaticSource {
    response: SourceResponse,
}

impl StaticSource {
    /// Answer with `data` and no errors
    pub fn new(data: Value) -> Self {
        Self {
            response: SourceResponse::ok(data),
        }
    }

    /// Answer with a prepared response
    pub fn with_response(response: SourceResponse) -> Self {
        Self { response }
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    async fn query(&self, _query: &str) -> SourceResponse {
        self.response.clone()
    }
}

/// A source reading a JSON document from disk.
///
/// The file may be a bare payload or an object with `data` / `errors` keys.
/// Read and parse failures are reported as source errors.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source over `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn query(&self, _query: &str) -> SourceResponse {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                return SourceResponse::failed(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                ))
            }
        };

        let value: Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                return SourceResponse::failed(format!(
                    "Invalid JSON in {}: {}",
                    self.path.display(),
                    e
                ))
            }
        };

        match value {
            Value::Object(ref map) if map.contains_key("data") || map.contains_key("errors") => {
                serde_json::from_value(value.clone())
                    .unwrap_or_else(|e| SourceResponse::failed(format!("Malformed response: {}", e)))
            }
            other => SourceResponse::ok(other),
        }
    }
}
