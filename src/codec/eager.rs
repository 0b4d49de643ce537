//! Eager restore: fetch and decode every shard up front

use futures_util::future::try_join_all;
use serde::de::DeserializeOwned;

use super::errors::CodecResult;
use super::shard::{decode_shard, ShardTable};
use crate::record::IndexKey;
use crate::storage::{shard_path, table_path, ShardStore};

/// A fully decoded index
#[derive(Debug, Clone)]
pub struct EagerIndex<P> {
    pub table: ShardTable,
    /// All entries, in key order
    pub entries: Vec<(IndexKey, P)>,
}

/// Fetch the shard table and all shards concurrently, then concatenate in
/// sequence order.
pub async fn restore_eager<P: DeserializeOwned + Send>(
    store: &dyn ShardStore,
    build_id: &str,
    index_id: &str,
) -> CodecResult<EagerIndex<P>> {
    let path = table_path(build_id, index_id);
    let table = ShardTable::from_json(&path, &store.get(&path).await?)?;

    let decoded = try_join_all(table.shards.iter().map(|descriptor| async move {
        let path = shard_path(build_id, index_id, descriptor.seq);
        let bytes = store.get(&path).await?;
        decode_shard::<P>(&path, &bytes, descriptor)
    }))
    .await?;

    let entries = decoded.into_iter().flatten().collect();
    Ok(EagerIndex { table, entries })
}
