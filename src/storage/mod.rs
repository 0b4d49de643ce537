//! Shard storage
//!
//! Durable home of manifests, shard tables and shards. The build writes
//! through `put`; query-time restore only ever calls `get`. Reads are
//! GET-style: a failed read is a failed read, regardless of cause.

mod errors;
mod layout;
mod local;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use layout::{
    manifest_path, primary_index_id, shard_path, table_path, validate_path, validate_segment,
};
pub use local::LocalStore;
pub use memory::MemoryStore;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

/// Byte-addressable object store for build artifacts
#[async_trait]
pub trait ShardStore: Send + Sync + fmt::Debug {
    /// Fetch an object
    async fn get(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Write an object, replacing any previous content
    async fn put(&self, path: &str, bytes: &[u8]) -> StoreResult<()>;

    /// Whether an object exists
    async fn exists(&self, path: &str) -> bool;

    /// Remove every object under `prefix`; a missing prefix is not an error
    async fn clear(&self, prefix: &str) -> StoreResult<()>;
}

/// Shared store handle
pub type SharedStore = Arc<dyn ShardStore>;
