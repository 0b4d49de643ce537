//! In-process store
//!
//! Keeps objects in a sorted map and records every fetched path, which
//! makes the lazy restore path observable.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::errors::{StoreError, StoreResult};
use super::layout::validate_path;
use super::ShardStore;

/// Map-backed store
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    fetched: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an object directly
    pub fn insert(&self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects.write().insert(path.into(), bytes.into());
    }

    /// Remove an object directly
    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.write().remove(path)
    }

    /// Stored bytes at `path`, without recording a fetch
    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().get(path).cloned()
    }

    /// Stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    /// Number of successful and failed `get` calls
    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().len()
    }

    /// Paths passed to `get`, in call order
    pub fn fetched_paths(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }

    pub fn reset_fetches(&self) {
        self.fetched.lock().clear();
    }
}

#[async_trait]
impl ShardStore for MemoryStore {
    async fn get(&self, path: &str) -> StoreResult<Vec<u8>> {
        self.fetched.lock().push(path.to_string());
        self.objects
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::fetch(path, "not found"))
    }

    async fn put(&self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        validate_path(path)?;
        self.objects.write().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.objects.read().contains_key(path)
    }

    async fn clear(&self, prefix: &str) -> StoreResult<()> {
        validate_path(prefix)?;
        let dir = format!("{}/", prefix);
        self.objects
            .write()
            .retain(|path, _| path != prefix && !path.starts_with(&dir));
        Ok(())
    }
}
