//! Build orchestration
//!
//! Turns a record source and a `BuildOptions` bag into a build directory:
//! one primary data index (`data.<buildId>`), one shard set per secondary
//! index, and a manifest written last.
//!
//! Builds are full rebuilds. The build directory is cleared before any
//! shard is written, so no stale shard of a previous build survives.

mod errors;
mod ledger;
mod manifest;
mod options;
mod orchestrator;

pub use errors::{BuildError, BuildResult};
pub use ledger::{build_if_needed, BuildLedger, BuildOutcome, LedgerEntry};
pub use manifest::Manifest;
pub use options::{BuildOptions, EngineSelector, DEFAULT_CHUNK_SIZE, DEFAULT_DATA_CHUNK_SIZE};
pub use orchestrator::{build_index, BuildReport, IndexSummary};
