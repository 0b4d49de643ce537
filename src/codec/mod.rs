//! Chunk codec
//!
//! Serializes index snapshots into bounded shards and restores them,
//! either all at once (`restore_eager`) or shard by shard on demand
//! (`restore_lazy`).
//!
//! Shards are immutable and checksummed. Concatenating the shards of an
//! index in sequence order reconstructs its snapshot.

mod checksum;
mod eager;
mod errors;
mod lazy;
mod shard;

pub use checksum::{compute_checksum, format_checksum, parse_checksum};
pub use eager::{restore_eager, EagerIndex};
pub use errors::{CodecError, CodecResult};
pub use lazy::{restore_lazy, LazyIndex, LazyShard, LazyState, SharedLazyIndex};
pub use shard::{decode_shard, persist, shard, Shard, ShardDescriptor, ShardTable};
