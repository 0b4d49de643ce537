//! Lazily restored indices
//!
//! `restore_lazy` fetches only the shard table. Each shard sits behind a
//! `LazyShard`: it is fetched and decoded on first access and cached for the
//! lifetime of the handle. Concurrent readers of an unfetched shard share a
//! single fetch.

use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use super::errors::CodecResult;
use super::shard::{decode_shard, ShardDescriptor, ShardTable};
use crate::record::IndexKey;
use crate::storage::{shard_path, table_path, SharedStore};

/// Observable load state of a lazy shard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyState {
    NotFetched,
    Fetching,
    Fetched,
}

/// A shard that loads itself on first access
#[derive(Debug)]
pub struct LazyShard<P> {
    descriptor: ShardDescriptor,
    path: String,
    cell: OnceCell<Vec<(IndexKey, P)>>,
    in_flight: AtomicBool,
}

impl<P: DeserializeOwned> LazyShard<P> {
    fn new(descriptor: ShardDescriptor, path: String) -> Self {
        Self {
            descriptor,
            path,
            cell: OnceCell::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn descriptor(&self) -> &ShardDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> LazyState {
        if self.cell.initialized() {
            LazyState::Fetched
        } else if self.in_flight.load(Ordering::Acquire) {
            LazyState::Fetching
        } else {
            LazyState::NotFetched
        }
    }

    /// Decoded entries, fetching on first call.
    ///
    /// A failed fetch leaves the shard unfetched; the next call retries.
    pub async fn load(&self, store: &SharedStore) -> CodecResult<&[(IndexKey, P)]> {
        let entries = self
            .cell
            .get_or_try_init(|| async {
                let _fetching = InFlight::enter(&self.in_flight);
                match store.get(&self.path).await {
                    Ok(bytes) => decode_shard(&self.path, &bytes, &self.descriptor),
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        Ok(entries.as_slice())
    }
}

/// Marks a shard as fetching until dropped, including when the load future
/// is dropped mid-fetch
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle to a secondary index whose shards load on demand
#[derive(Debug)]
pub struct LazyIndex<P> {
    store: SharedStore,
    table: ShardTable,
    shards: Vec<LazyShard<P>>,
}

/// Fetch an index's shard table and wrap its shards in lazy handles
pub async fn restore_lazy<P: DeserializeOwned>(
    store: SharedStore,
    build_id: &str,
    index_id: &str,
) -> CodecResult<LazyIndex<P>> {
    let path = table_path(build_id, index_id);
    let bytes = store.get(&path).await?;
    let table = ShardTable::from_json(&path, &bytes)?;

    let shards = table
        .shards
        .iter()
        .map(|d| LazyShard::new(d.clone(), shard_path(build_id, index_id, d.seq)))
        .collect();

    Ok(LazyIndex {
        store,
        table,
        shards,
    })
}

fn overlaps(descriptor: &ShardDescriptor, lower: Bound<&IndexKey>, upper: Bound<&IndexKey>) -> bool {
    let above_lower = match lower {
        Bound::Included(k) => &descriptor.last >= k,
        Bound::Excluded(k) => &descriptor.last > k,
        Bound::Unbounded => true,
    };
    let below_upper = match upper {
        Bound::Included(k) => &descriptor.first <= k,
        Bound::Excluded(k) => &descriptor.first < k,
        Bound::Unbounded => true,
    };
    above_lower && below_upper
}

fn in_range(key: &IndexKey, lower: Bound<&IndexKey>, upper: Bound<&IndexKey>) -> bool {
    let above_lower = match lower {
        Bound::Included(k) => key >= k,
        Bound::Excluded(k) => key > k,
        Bound::Unbounded => true,
    };
    let below_upper = match upper {
        Bound::Included(k) => key <= k,
        Bound::Excluded(k) => key < k,
        Bound::Unbounded => true,
    };
    above_lower && below_upper
}

impl<P: DeserializeOwned + Clone + Send + Sync> LazyIndex<P> {
    pub fn table(&self) -> &ShardTable {
        &self.table
    }

    pub fn id(&self) -> &str {
        &self.table.id
    }

    /// Total entries across all shards, known without fetching any shard
    pub fn total(&self) -> usize {
        self.table.total
    }

    pub fn shard_states(&self) -> Vec<LazyState> {
        self.shards.iter().map(LazyShard::state).collect()
    }

    /// Number of shards currently decoded in memory
    pub fn fetched_shards(&self) -> usize {
        self.shards
            .iter()
            .filter(|s| s.state() == LazyState::Fetched)
            .count()
    }

    /// Payload stored under `key`.
    ///
    /// Scans the shard table for the covering shard and loads only that one.
    pub async fn get(&self, key: &IndexKey) -> CodecResult<Option<P>> {
        let Some(shard) = self.shards.iter().find(|s| s.descriptor.covers(key)) else {
            return Ok(None);
        };

        let entries = shard.load(&self.store).await?;
        Ok(entries
            .binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|pos| entries[pos].1.clone()))
    }

    /// Entries with keys inside the given bounds, in key order.
    ///
    /// Overlapping shards are loaded concurrently.
    pub async fn range(
        &self,
        lower: Bound<&IndexKey>,
        upper: Bound<&IndexKey>,
    ) -> CodecResult<Vec<(IndexKey, P)>> {
        let wanted: Vec<&LazyShard<P>> = self
            .shards
            .iter()
            .filter(|s| overlaps(&s.descriptor, lower, upper))
            .collect();

        let loaded = try_join_all(wanted.iter().map(|s| s.load(&self.store))).await?;

        Ok(loaded
            .into_iter()
            .flat_map(|entries| entries.iter())
            .filter(|(k, _)| in_range(k, lower, upper))
            .cloned()
            .collect())
    }
}

/// Shared lazy index handle
pub type SharedLazyIndex<P> = Arc<LazyIndex<P>>;
