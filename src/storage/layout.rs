//! Addresses of build artifacts inside a store
//!
//! ```text
//! <buildId>/indices.<buildId>.json     manifest
//! <buildId>/<indexId>/index.json       shard table
//! <buildId>/<indexId>/<seq>.json       shard
//! ```

use super::errors::{StoreError, StoreResult};

/// Id of the primary data index of a build
pub fn primary_index_id(build_id: &str) -> String {
    format!("data.{}", build_id)
}

/// Manifest address
pub fn manifest_path(build_id: &str) -> String {
    format!("{}/indices.{}.json", build_id, build_id)
}

/// Shard table address of one index
pub fn table_path(build_id: &str, index_id: &str) -> String {
    format!("{}/{}/index.json", build_id, index_id)
}

/// Address of one shard
pub fn shard_path(build_id: &str, index_id: &str, seq: usize) -> String {
    format!("{}/{}/{}.json", build_id, index_id, seq)
}

/// Check that `segment` can name a single directory level.
pub fn validate_segment(segment: &str) -> StoreResult<()> {
    let bad = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || segment.contains('\\')
        || segment.contains('\0');

    if bad {
        Err(StoreError::InvalidPath(segment.to_string()))
    } else {
        Ok(())
    }
}

/// Check a relative, `/`-separated store path
pub fn validate_path(path: &str) -> StoreResult<()> {
    if path.starts_with('/') {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    path.split('/')
        .try_for_each(validate_segment)
        .map_err(|_| StoreError::InvalidPath(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(primary_index_id("site"), "data.site");
        assert_eq!(manifest_path("site"), "site/indices.site.json");
        assert_eq!(table_path("site", "by-name"), "site/by-name/index.json");
        assert_eq!(shard_path("site", "by-name", 2), "site/by-name/2.json");
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("by-name").is_ok());
        assert!(validate_segment("data.site").is_ok());
        assert!(validate_segment("").is_err());
        assert!(validate_segment("..").is_err());
        assert!(validate_segment("a/b").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("site/by-name/0.json").is_ok());
        assert!(validate_path("/etc/passwd").is_err());
        assert!(validate_path("site/../other").is_err());
        assert!(validate_path("site//x").is_err());
    }
}
