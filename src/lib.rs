//! cdnsearch - build-time sharded search indices for static delivery
//!
//! A build reads records from a source, indexes them with the configured
//! engines, and writes every index as immutable, checksummed JSON shards plus
//! a manifest. At query time a `Db` is restored from the manifest: the
//! primary index eagerly, secondary indices lazily (only their shard tables),
//! fetching shards on demand as cursors page through results.
//!
//! ```text
//! RecordSource -> build_index -> ShardStore -> restore_db -> Db -> Cursor / LiveCursor
//! ```

pub mod build;
pub mod cli;
pub mod codec;
pub mod cursor;
pub mod engine;
pub mod observability;
pub mod record;
pub mod schema;
pub mod storage;

pub use build::{build_if_needed, build_index, BuildError, BuildLedger, BuildOptions, BuildReport};
pub use cursor::{Cursor, CursorError, CursorParams, CursorView, LiveCursor};
pub use engine::{EngineKind, IndexSpec};
pub use record::{IndexKey, Normalizer, Record, RecordId, RecordSource};
pub use schema::{restore_db, Db, Page, Query, RestoreError, SortSpec};
pub use storage::{LocalStore, MemoryStore, ShardStore, SharedStore};
