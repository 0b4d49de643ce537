//! Build orchestration
//!
//! Sequence:
//!
//! 1. Validate options (engine tags, chunk sizes, normalizer)
//! 2. Query the record source; any reported error aborts
//! 3. Normalize into records
//! 4. Feed every record, in source order, to the primary index and to each
//!    secondary index; the first record without a valid, unique identifier
//!    aborts before anything is written
//! 5. Clear the build directory
//! 6. Shard and persist all indices concurrently
//! 7. Write the manifest
//!
//! A failure after step 5 removes the partial build directory.

use std::collections::BTreeMap;

use futures_util::future::try_join_all;
use serde::Serialize;
use serde_json::Value;

use super::errors::{BuildError, BuildResult};
use super::manifest::Manifest;
use super::options::BuildOptions;
use crate::codec::{persist, shard, ShardTable};
use crate::engine::{EngineKind, IndexEngine, IndexSpec};
use crate::observability::{Logger, ObservationScope};
use crate::record::{IndexKey, Record, RecordId, RecordSource};
use crate::storage::{manifest_path, ShardStore};

/// Shard summary of one persisted index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub id: String,
    pub engine: String,
    pub shards: usize,
    pub total: usize,
}

impl IndexSummary {
    fn new(engine: &str, table: &ShardTable) -> Self {
        Self {
            id: table.id.clone(),
            engine: engine.to_string(),
            shards: table.shards.len(),
            total: table.total,
        }
    }
}

/// Outcome of a completed build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub build_id: String,
    pub records: usize,
    pub primary: IndexSummary,
    pub indices: Vec<IndexSummary>,
}

/// In-memory indices of one build, before sharding
struct Populated {
    records: usize,
    primary: BTreeMap<RecordId, Record>,
    secondaries: Vec<(IndexSpec, IndexEngine)>,
}

/// Run a full build of `options.id` into `store`.
///
/// On success the manifest is the last object written. On failure no
/// manifest exists for the build, except that errors detected before the
/// clear step (configuration, source, normalization, identifiers) leave a
/// previous build's output untouched.
pub async fn build_index(
    source: &dyn RecordSource,
    options: &BuildOptions,
    store: &dyn ShardStore,
) -> BuildResult<BuildReport> {
    let scope = ObservationScope::with_fields("BUILD", &[("build_id", options.id.as_str())]);

    match run(source, options, store).await {
        Ok(report) => {
            scope.complete_with_fields(&[
                ("records", report.records.to_string().as_str()),
                ("indices", report.indices.len().to_string().as_str()),
            ]);
            Ok(report)
        }
        Err(e) => {
            scope.fail(e.to_string().as_str());
            Err(e)
        }
    }
}

async fn run(
    source: &dyn RecordSource,
    options: &BuildOptions,
    store: &dyn ShardStore,
) -> BuildResult<BuildReport> {
    options.validate()?;
    let default = options.default_engine()?;

    let response = source.query(options.query()).await;
    if response.has_errors() {
        let first = response
            .errors
            .first()
            .map(|e| match e {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        return Err(BuildError::Source {
            count: response.errors.len(),
            first,
        });
    }

    let normalizer = options
        .normalizer
        .as_ref()
        .ok_or_else(|| BuildError::config("a normalizer is required"))?;
    let records = normalizer
        .normalize(&response)
        .map_err(BuildError::Normalize)?;

    let populated = populate(options, default, records)?;
    Logger::info(
        "BUILD_POPULATED",
        &[
            ("build_id", options.id.as_str()),
            ("records", populated.records.to_string().as_str()),
        ],
    );

    store.clear(&options.id).await?;

    match write_all(options, store, populated).await {
        Ok(report) => Ok(report),
        Err(e) => {
            // no half-written build directory survives a failed build
            if let Err(cleanup) = store.clear(&options.id).await {
                Logger::warn(
                    "BUILD_CLEANUP_FAILED",
                    &[("build_id", options.id.as_str()), ("reason", cleanup.to_string().as_str())],
                );
            }
            Err(e)
        }
    }
}

/// Copy of `record` restricted to the identifier and `data_attrs`
fn project(record: &Record, id_attr: &str, data_attrs: &[String]) -> Record {
    if data_attrs.is_empty() {
        return record.clone();
    }

    record
        .iter()
        .filter(|(k, _)| k.as_str() == id_attr || data_attrs.iter().any(|a| a == *k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn populate(
    options: &BuildOptions,
    default: EngineKind,
    records: Vec<Record>,
) -> BuildResult<Populated> {
    let mut secondaries = options
        .indices
        .iter()
        .map(|spec| -> BuildResult<(IndexSpec, IndexEngine)> {
            let resolved = spec.resolved(default)?;
            let engine = IndexEngine::from_spec(&resolved, default)?;
            Ok((resolved, engine))
        })
        .collect::<BuildResult<Vec<_>>>()?;

    let mut primary = BTreeMap::new();
    let count = records.len();

    for (position, record) in records.into_iter().enumerate() {
        let id = match record.get(&options.id_attr) {
            None | Some(Value::Null) => {
                return Err(BuildError::record(
                    position,
                    format!("missing identifier '{}'", options.id_attr),
                ))
            }
            Some(value) => IndexKey::from_json(value).ok_or_else(|| {
                BuildError::record(
                    position,
                    format!("identifier '{}' must be a scalar, got {}", options.id_attr, value),
                )
            })?,
        };

        if primary.contains_key(&id) {
            return Err(BuildError::record(
                position,
                format!("duplicate identifier '{}'", id),
            ));
        }

        for (spec, engine) in secondaries.iter_mut() {
            engine.add_record(&id, &record, &spec.fields());
        }

        let stored = project(&record, &options.id_attr, &options.data_attrs);
        primary.insert(id, stored);
    }

    Ok(Populated {
        records: count,
        primary,
        secondaries,
    })
}

async fn write_all(
    options: &BuildOptions,
    store: &dyn ShardStore,
    populated: Populated,
) -> BuildResult<BuildReport> {
    let build_id = options.id.as_str();
    let primary_id = options.primary_index_id();

    let mut specs = Vec::with_capacity(populated.secondaries.len());
    let mut secondary_shards = Vec::with_capacity(populated.secondaries.len());
    for (spec, engine) in populated.secondaries {
        let kind = engine.kind();
        let shards = shard(&spec.id, engine.into_entries(), options.chunk_size)?;
        secondary_shards.push((spec.id.clone(), kind, shards));
        specs.push(spec);
    }

    let primary_entries: Vec<(RecordId, Record)> = populated.primary.into_iter().collect();
    let primary_shards = shard(&primary_id, primary_entries, options.data_chunk_size)?;

    let secondaries = try_join_all(secondary_shards.iter().map(|(id, kind, shards)| async move {
        let table = persist(store, build_id, id, options.chunk_size, shards).await?;
        Logger::info(
            "INDEX_PERSISTED",
            &[
                ("build_id", build_id),
                ("index_id", id.as_str()),
                ("engine", kind.tag()),
                ("shards", table.shards.len().to_string().as_str()),
            ],
        );
        Ok::<_, BuildError>(IndexSummary::new(kind.tag(), &table))
    }));
    let primary = persist(
        store,
        build_id,
        &primary_id,
        options.data_chunk_size,
        &primary_shards,
    );

    let (indices, primary_table) = tokio::try_join!(secondaries, async {
        Ok::<_, BuildError>(primary.await?)
    })?;

    let manifest = Manifest::new(specs, options.id_attr.clone());
    let json = manifest
        .to_json()
        .map_err(|e| BuildError::config(format!("Failed to serialize manifest: {}", e)))?;
    store.put(&manifest_path(build_id), json.as_bytes()).await?;

    Ok(BuildReport {
        build_id: build_id.to_string(),
        records: populated.records,
        primary: IndexSummary::new("simple", &primary_table),
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Normalizer, SourceResponse, StaticSource};
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn people() -> StaticSource {
        StaticSource::new(json!([
            {"id": 1, "name": "a", "bio": "likes rust"},
            {"id": 2, "name": "b", "bio": "likes go"},
            {"id": 3, "name": "c", "bio": "likes rust and go"},
            {"id": 4, "name": "d", "bio": "writes docs"},
            {"id": 5, "name": "e", "bio": "reviews code"}
        ]))
    }

    fn options() -> BuildOptions {
        BuildOptions::new("people", "id")
            .with_normalizer(Normalizer::pointer(""))
            .with_chunk_size(2)
            .with_index(IndexSpec::single("by-name", "name", EngineKind::Simple))
    }

    #[tokio::test]
    async fn test_build_writes_shards_and_manifest() {
        let store = MemoryStore::new();
        let report = build_index(&people(), &options(), &store).await.unwrap();

        assert_eq!(report.records, 5);
        assert_eq!(report.indices[0].shards, 3);
        assert_eq!(report.primary.id, "data.people");
        assert_eq!(report.primary.total, 5);

        let manifest =
            Manifest::from_slice(&store.get("people/indices.people.json").await.unwrap()).unwrap();
        assert_eq!(manifest.indices.len(), 1);
        assert_eq!(manifest.id_attr, "id");
        assert!(store.exists("people/by-name/2.json").await);
        assert!(!store.exists("people/by-name/3.json").await);
    }

    #[tokio::test]
    async fn test_source_errors_abort() {
        let store = MemoryStore::new();
        let source = StaticSource::with_response(SourceResponse::failed("boom"));

        let err = build_index(&source, &options(), &store).await.unwrap_err();
        assert_eq!(
            err,
            BuildError::Source {
                count: 1,
                first: "boom".to_string()
            }
        );
        assert!(store.paths().is_empty());
    }

    #[tokio::test]
    async fn test_missing_identifier_leaves_no_output() {
        let store = MemoryStore::new();
        let source = StaticSource::new(json!([{"id": 1, "name": "a"}, {"name": "b"}]));

        let err = build_index(&source, &options(), &store).await.unwrap_err();
        assert_eq!(err.code(), "CDN_BUILD_RECORD");
        assert!(matches!(err, BuildError::Record { position: 1, .. }));
        assert!(store.paths().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_identifier_rejected() {
        let store = MemoryStore::new();
        let source = StaticSource::new(json!([{"id": 1}, {"id": 1}]));

        let err = build_index(&source, &options(), &store).await.unwrap_err();
        assert!(matches!(err, BuildError::Record { position: 1, .. }));
    }

    #[tokio::test]
    async fn test_rebuild_removes_stale_shards() {
        let store = MemoryStore::new();
        store.insert("people/stale/0.json", "[]");
        store.insert("other/keep.json", "{}");

        build_index(&people(), &options(), &store).await.unwrap();

        assert!(!store.exists("people/stale/0.json").await);
        assert!(store.exists("other/keep.json").await);
    }

    #[tokio::test]
    async fn test_empty_record_set() {
        let store = MemoryStore::new();
        let report = build_index(&StaticSource::new(json!([])), &options(), &store)
            .await
            .unwrap();

        assert_eq!(report.records, 0);
        assert_eq!(report.indices[0].shards, 0);
        assert!(store.exists("people/indices.people.json").await);
        assert!(store.exists("people/by-name/index.json").await);
    }

    #[tokio::test]
    async fn test_manifest_resolves_default_engine() {
        let store = MemoryStore::new();
        let mut spec = IndexSpec::single("by-bio", "bio", EngineKind::Simple);
        spec.engine = None;
        let options = BuildOptions::new("people", "id")
            .with_normalizer(Normalizer::pointer(""))
            .with_default_engine(EngineKind::TextLex)
            .with_index(spec);

        build_index(&people(), &options, &store).await.unwrap();

        let manifest =
            Manifest::from_slice(&store.get("people/indices.people.json").await.unwrap()).unwrap();
        assert_eq!(manifest.indices[0].engine.as_deref(), Some("text-lex"));
    }

    #[test]
    fn test_project_keeps_id_and_data_attrs() {
        let record = json!({"id": 1, "name": "a", "bio": "x"}).as_object().cloned().unwrap();
        let projected = project(&record, "id", &["name".to_string()]);
        assert_eq!(Value::Object(projected), json!({"id": 1, "name": "a"}));

        let whole = project(&record, "id", &[]);
        assert_eq!(whole, record);
    }
}
