//! Shards and shard tables
//!
//! An index snapshot is a key-sorted list of `(IndexKey, payload)` entries.
//! `shard` cuts it into runs of at most `chunk_size` entries; `persist`
//! writes each run to `<buildId>/<indexId>/<seq>.json` and finally the
//! shard table to `<buildId>/<indexId>/index.json`.
//!
//! Shard table format:
//! ```json
//! {
//!   "id": "by-name",
//!   "chunkSize": 2,
//!   "total": 5,
//!   "shards": [
//!     { "seq": 0, "first": {"String": "a"}, "last": {"String": "b"}, "count": 2, "checksum": "crc32:1a2b3c4d" }
//!   ]
//! }
//! ```

use futures_util::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::checksum::{compute_checksum, format_checksum};
use super::errors::{CodecError, CodecResult};
use crate::record::IndexKey;
use crate::storage::{shard_path, table_path, ShardStore};

/// One immutable, sequence-numbered slice of an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shard<P> {
    pub index_id: String,
    pub seq: usize,
    pub entries: Vec<(IndexKey, P)>,
}

/// Shard table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardDescriptor {
    pub seq: usize,
    pub first: IndexKey,
    pub last: IndexKey,
    pub count: usize,
    pub checksum: String,
}

impl ShardDescriptor {
    /// Whether `key` falls inside this shard's key range
    pub fn covers(&self, key: &IndexKey) -> bool {
        &self.first <= key && key <= &self.last
    }
}

/// Per-index table of shards, fetched before any shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardTable {
    pub id: String,
    pub chunk_size: usize,
    /// Total entries across all shards
    pub total: usize,
    pub shards: Vec<ShardDescriptor>,
}

impl ShardTable {
    pub fn to_json(&self) -> CodecResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CodecError::encode(&self.id, e))
    }

    pub fn from_json(path: &str, bytes: &[u8]) -> CodecResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::decode(path, e))
    }
}

/// Split key-sorted `entries` into shards of at most `chunk_size` entries.
///
/// An empty snapshot yields no shards.
pub fn shard<P>(
    index_id: &str,
    entries: Vec<(IndexKey, P)>,
    chunk_size: usize,
) -> CodecResult<Vec<Shard<P>>> {
    if chunk_size == 0 {
        return Err(CodecError::InvalidChunkSize(index_id.to_string()));
    }

    let mut shards = Vec::with_capacity(entries.len().div_ceil(chunk_size));
    let mut current = Vec::with_capacity(chunk_size);

    for entry in entries {
        current.push(entry);
        if current.len() == chunk_size {
            shards.push(Shard {
                index_id: index_id.to_string(),
                seq: shards.len(),
                entries: std::mem::replace(&mut current, Vec::with_capacity(chunk_size)),
            });
        }
    }

    if !current.is_empty() {
        shards.push(Shard {
            index_id: index_id.to_string(),
            seq: shards.len(),
            entries: current,
        });
    }

    Ok(shards)
}

/// Encode one shard and describe it
fn encode_shard<P: Serialize>(
    path: &str,
    shard: &Shard<P>,
) -> CodecResult<(Vec<u8>, Option<ShardDescriptor>)> {
    let bytes = serde_json::to_vec(shard).map_err(|e| CodecError::encode(path, e))?;

    let descriptor = match (shard.entries.first(), shard.entries.last()) {
        (Some((first, _)), Some((last, _))) => Some(ShardDescriptor {
            seq: shard.seq,
            first: first.clone(),
            last: last.clone(),
            count: shard.entries.len(),
            checksum: format_checksum(compute_checksum(&bytes)),
        }),
        _ => None,
    };

    Ok((bytes, descriptor))
}

/// Decode a fetched shard, verifying it against its table row
pub fn decode_shard<P: DeserializeOwned>(
    path: &str,
    bytes: &[u8],
    descriptor: &ShardDescriptor,
) -> CodecResult<Vec<(IndexKey, P)>> {
    let actual = format_checksum(compute_checksum(bytes));
    if actual != descriptor.checksum {
        return Err(CodecError::ChecksumMismatch {
            path: path.to_string(),
            expected: descriptor.checksum.clone(),
            actual,
        });
    }

    let shard: Shard<P> = serde_json::from_slice(bytes).map_err(|e| CodecError::decode(path, e))?;

    if shard.seq != descriptor.seq || shard.entries.len() != descriptor.count {
        return Err(CodecError::decode(
            path,
            format!(
                "expected seq {} with {} entries, found seq {} with {}",
                descriptor.seq,
                descriptor.count,
                shard.seq,
                shard.entries.len()
            ),
        ));
    }

    Ok(shard.entries)
}

/// Write every shard, then the shard table.
///
/// Shards of one index are written concurrently; the table goes last.
pub async fn persist<P: Serialize + Sync>(
    store: &dyn ShardStore,
    build_id: &str,
    index_id: &str,
    chunk_size: usize,
    shards: &[Shard<P>],
) -> CodecResult<ShardTable> {
    let mut encoded = Vec::with_capacity(shards.len());
    let mut descriptors = Vec::with_capacity(shards.len());

    for shard in shards {
        let path = shard_path(build_id, index_id, shard.seq);
        let (bytes, descriptor) = encode_shard(&path, shard)?;
        if let Some(descriptor) = descriptor {
            descriptors.push(descriptor);
        }
        encoded.push((path, bytes));
    }

    try_join_all(
        encoded
            .iter()
            .map(|(path, bytes)| store.put(path, bytes)),
    )
    .await?;

    let table = ShardTable {
        id: index_id.to_string(),
        chunk_size,
        total: descriptors.iter().map(|d| d.count).sum(),
        shards: descriptors,
    };

    store
        .put(&table_path(build_id, index_id), table.to_json()?.as_bytes())
        .await?;

    Ok(table)
}
