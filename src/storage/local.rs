//! Filesystem-backed store

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::errors::{StoreError, StoreResult};
use super::layout::validate_path;
use super::ShardStore;

/// Store rooted at a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }
}

/// Write through a temp file, fsync, then rename into place.
async fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp = target.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, target).await
}

#[async_trait]
impl ShardStore for LocalStore {
    async fn get(&self, path: &str) -> StoreResult<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full)
            .await
            .map_err(|e| StoreError::fetch(path, e))
    }

    async fn put(&self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        let full = self.resolve(path)?;
        write_atomic(&full, bytes)
            .await
            .map_err(|e| StoreError::write(path, e))
    }

    async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full) => fs::metadata(&full).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn clear(&self, prefix: &str) -> StoreResult<()> {
        let full = self.resolve(prefix)?;
        match fs::remove_dir_all(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::write(prefix, e)),
        }
    }
}
