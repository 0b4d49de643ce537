//! Build ledger
//!
//! Explicit record of completed builds, persisted as JSON next to the
//! build output:
//! ```json
//! { "builds": { "posts": { "builtAt": "2026-10-18T09:00:00Z", "indices": ["by-title"] } } }
//! ```
//!
//! A build is skipped only when the ledger lists its id AND its manifest is
//! still present in the store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{BuildError, BuildResult};
use super::options::BuildOptions;
use super::orchestrator::{build_index, BuildReport};
use crate::observability::Logger;
use crate::record::RecordSource;
use crate::storage::{manifest_path, ShardStore};

/// One completed build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub built_at: DateTime<Utc>,
    pub indices: Vec<String>,
}

/// Completed builds by id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildLedger {
    #[serde(skip)]
    path: PathBuf,
    builds: BTreeMap<String, LedgerEntry>,
}

/// Result of `build_if_needed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Built(BuildReport),
    Skipped { build_id: String },
}

impl BuildLedger {
    /// Open the ledger at `path`; a missing file is an empty ledger
    pub async fn open(path: impl Into<PathBuf>) -> BuildResult<Self> {
        let path = path.into();

        let mut ledger = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<BuildLedger>(&bytes)
                .map_err(|e| BuildError::ledger(&path, e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BuildLedger::default(),
            Err(e) => return Err(BuildError::ledger(&path, e)),
        };

        ledger.path = path;
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, build_id: &str) -> bool {
        self.builds.contains_key(build_id)
    }

    pub fn entry(&self, build_id: &str) -> Option<&LedgerEntry> {
        self.builds.get(build_id)
    }

    /// Record a completed build
    pub fn record(&mut self, report: &BuildReport) {
        self.builds.insert(
            report.build_id.clone(),
            LedgerEntry {
                built_at: Utc::now(),
                indices: report.indices.iter().map(|i| i.id.clone()).collect(),
            },
        );
    }

    /// Forget a build, forcing the next `build_if_needed` to run it
    pub fn forget(&mut self, build_id: &str) -> bool {
        self.builds.remove(build_id).is_some()
    }

    /// Write the ledger back to its file
    pub async fn save(&self) -> BuildResult<()> {
        let json =
            serde_json::to_vec_pretty(self).map_err(|e| BuildError::ledger(&self.path, e))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildError::ledger(&self.path, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| BuildError::ledger(&self.path, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| BuildError::ledger(&self.path, e))
    }
}

/// Build `options.id` unless the ledger shows a completed build whose
/// manifest is still in the store.
pub async fn build_if_needed(
    source: &dyn RecordSource,
    options: &BuildOptions,
    store: &dyn ShardStore,
    ledger: &mut BuildLedger,
) -> BuildResult<BuildOutcome> {
    if ledger.contains(&options.id) && store.exists(&manifest_path(&options.id)).await {
        Logger::info("BUILD_SKIPPED", &[("build_id", options.id.as_str())]);
        return Ok(BuildOutcome::Skipped {
            build_id: options.id.clone(),
        });
    }

    let report = build_index(source, options, store).await?;
    ledger.record(&report);
    ledger.save().await?;

    Ok(BuildOutcome::Built(report))
}
