//! Normalizers map a source response to the flat record list the build indexes.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::source::SourceResponse;
use super::Record;

/// Closure form of a normalizer
pub type NormalizeFn = Arc<dyn Fn(&SourceResponse) -> Result<Vec<Record>, String> + Send + Sync>;

/// How raw source output becomes records.
///
/// Config files can only express `{"pointer": "/data/allPosts/nodes"}`;
/// `Custom` is set programmatically.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Normalizer {
    /// Take the array found at a JSON pointer into `data`
    Pointer(String),
    /// Arbitrary mapping function
    #[serde(skip)]
    Custom(NormalizeFn),
}

impl Normalizer {
    /// Wrap a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&SourceResponse) -> Result<Vec<Record>, String> + Send + Sync + 'static,
    {
        Normalizer::Custom(Arc::new(f))
    }

    /// Take the array at `pointer` (RFC 6901, empty string = whole payload)
    pub fn pointer(pointer: impl Into<String>) -> Self {
        Normalizer::Pointer(pointer.into())
    }

    /// Produce records from a response.
    ///
    /// Every element must be a JSON object.
    pub fn normalize(&self, response: &SourceResponse) -> Result<Vec<Record>, String> {
        match self {
            Normalizer::Custom(f) => f(response),
            Normalizer::Pointer(pointer) => {
                let target = response
                    .data
                    .pointer(pointer)
                    .ok_or_else(|| format!("Nothing found at pointer '{}'", pointer))?;

                let items = target
                    .as_array()
                    .ok_or_else(|| format!("Value at pointer '{}' is not an array", pointer))?;

                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::Object(map) => Ok(map.clone()),
                        _ => Err(format!("Element {} at pointer '{}' is not an object", i, pointer)),
                    })
                    .collect()
            }
        }
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalizer::Pointer(p) => f.debug_tuple("Pointer").field(p).finish(),
            Normalizer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pointer_normalizer() {
        let response = SourceResponse::ok(json!({"allPosts": {"nodes": [{"id": 1}, {"id": 2}]}}));
        let records = Normalizer::pointer("/allPosts/nodes").normalize(&response).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["id"], json!(2));
    }

    #[test]
    fn test_pointer_normalizer_rejects_non_objects() {
        let response = SourceResponse::ok(json!([{"id": 1}, 2]));
        let err = Normalizer::pointer("").normalize(&response).unwrap_err();
        assert!(err.contains("Element 1"));
    }

    #[test]
    fn test_pointer_normalizer_missing_path() {
        let response = SourceResponse::ok(json!({}));
        assert!(Normalizer::pointer("/missing").normalize(&response).is_err());
    }

    #[test]
    fn test_deserialize_pointer_form() {
        let normalizer: Normalizer = serde_json::from_value(json!({"pointer": "/items"})).unwrap();
        assert!(matches!(normalizer, Normalizer::Pointer(ref p) if p == "/items"));
    }

    #[test]
    fn test_custom_normalizer() {
        let normalizer = Normalizer::custom(|response| {
            Ok(response
                .data
                .as_array()
                .map(|items| items.iter().filter_map(|v| v.as_object().cloned()).collect())
                .unwrap_or_default())
        });
        let records = normalizer.normalize(&SourceResponse::ok(json!([{"id": "a"}]))).unwrap();
        assert_eq!(records.len(), 1);
    }
}
