//! Query-time restoration of a build
//!
//! 1. Fetch and parse the manifest
//! 2. Check every declared engine
//! 3. Restore the primary index eagerly
//! 4. Restore all secondary indices lazily, concurrently; only their shard
//!    tables are fetched here

use std::collections::BTreeMap;

use futures_util::future::try_join_all;

use super::db::Db;
use super::errors::{RestoreError, RestoreResult};
use super::schema::{Schema, SecondaryIndex};
use crate::build::Manifest;
use crate::codec::{restore_eager, restore_lazy};
use crate::engine::EngineKind;
use crate::observability::ObservationScope;
use crate::record::{Record, RecordId};
use crate::storage::{manifest_path, primary_index_id, SharedStore};

/// Restore build `build_id` from `store`
pub async fn restore_db(store: SharedStore, build_id: &str) -> RestoreResult<Db> {
    let scope = ObservationScope::with_fields("RESTORE", &[("build_id", build_id)]);

    match restore(store, build_id).await {
        Ok(db) => {
            scope.complete_with_fields(&[
                ("records", db.len().to_string().as_str()),
                ("indices", db.schema().indices().len().to_string().as_str()),
            ]);
            Ok(db)
        }
        Err(e) => {
            scope.fail(&e.to_string());
            Err(e)
        }
    }
}

async fn restore(store: SharedStore, build_id: &str) -> RestoreResult<Db> {
    let bytes = store
        .get(&manifest_path(build_id))
        .await
        .map_err(|e| RestoreError::manifest(build_id, e))?;
    let manifest = Manifest::from_slice(&bytes).map_err(|e| RestoreError::manifest(build_id, e))?;

    for spec in &manifest.indices {
        spec.engine_kind(EngineKind::Simple)?;
    }

    let primary_id = primary_index_id(build_id);
    let primary = restore_eager::<Record>(store.as_ref(), build_id, &primary_id)
        .await
        .map_err(|e| RestoreError::index(&primary_id, e))?;
    let primary: BTreeMap<RecordId, Record> = primary.entries.into_iter().collect();

    let indices = try_join_all(manifest.indices.into_iter().map(|spec| {
        let store = store.clone();
        async move {
            let handle = restore_lazy(store, build_id, &spec.id)
                .await
                .map_err(|e| RestoreError::index(&spec.id, e))?;
            SecondaryIndex::new(spec, handle)
        }
    }))
    .await?;

    Ok(Db::new(Schema::new(
        build_id,
        manifest.id_attr,
        primary,
        indices,
    )))
}
