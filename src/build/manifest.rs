//! Build manifest
//!
//! One per build, written last; its presence marks a completed build.
//!
//! Format:
//! ```json
//! { "indices": [{ "id": "by-name", "column": "name", "type": "simple" }], "idAttr": "id" }
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::IndexSpec;

/// Durable descriptor of a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Secondary index specs, engine tags resolved
    pub indices: Vec<IndexSpec>,
    pub id_attr: String,
}

impl Manifest {
    pub fn new(indices: Vec<IndexSpec>, id_attr: impl Into<String>) -> Self {
        Self {
            indices,
            id_attr: id_attr.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineKind;

    #[test]
    fn test_manifest_json_shape() {
        let manifest = Manifest::new(
            vec![IndexSpec::single("by-name", "name", EngineKind::Simple)],
            "id",
        );
        let value: serde_json::Value = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();

        assert_eq!(value["idAttr"], "id");
        assert_eq!(value["indices"][0]["type"], "simple");
        assert_eq!(Manifest::from_slice(manifest.to_json().unwrap().as_bytes()).unwrap(), manifest);
    }

    #[test]
    fn test_manifest_rejects_garbage() {
        assert!(Manifest::from_slice(b"{\"indices\": 3}").is_err());
    }
}
