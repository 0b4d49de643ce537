//! Build Pipeline Tests
//!
//! End-to-end build behavior against real stores:
//! - Output layout and manifest contents
//! - Rebuilds are byte-identical
//! - Query results do not depend on chunk sizes
//! - Record failures leave nothing on disk

use std::path::Path;
use std::sync::Arc;

use cdnsearch::build::{build_index, BuildOptions};
use cdnsearch::engine::{EngineKind, IndexSpec};
use cdnsearch::record::{Normalizer, Record, StaticSource};
use cdnsearch::schema::{restore_db, Db, Query, SortSpec};
use cdnsearch::storage::{LocalStore, MemoryStore, SharedStore};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn people() -> Value {
    json!([
        {"id": 7, "name": "grace", "city": "oslo", "age": 41, "bio": "Compilers and static analysis"},
        {"id": 2, "name": "alan", "city": "lima", "age": 29, "bio": "Search engines at scale"},
        {"id": 5, "name": "edsger", "city": "oslo", "age": 35, "bio": "Static sites and search"},
        {"id": 1, "name": "ada", "city": "rome", "age": 52, "bio": "Analysis of engines"},
        {"id": 9, "name": "barbara", "city": "lima", "age": 29, "bio": "Abstract data types"},
        {"id": 4, "name": "ken", "city": "rome", "age": 61, "bio": "Unix, regex and search"}
    ])
}

fn options(chunk_size: usize, data_chunk_size: usize) -> BuildOptions {
    BuildOptions::new("people", "id")
        .with_normalizer(Normalizer::pointer(""))
        .with_chunk_size(chunk_size)
        .with_data_chunk_size(data_chunk_size)
        .with_index(IndexSpec::single("by-city", "city", EngineKind::Simple))
        .with_index(IndexSpec::single("by-name", "name", EngineKind::NGram).with_actuation_limit(1))
        .with_index(IndexSpec::single("by-bio", "bio", EngineKind::TextLex))
}

async fn build_memory(chunk_size: usize, data_chunk_size: usize) -> Db {
    let memory = Arc::new(MemoryStore::new());
    build_index(
        &StaticSource::new(people()),
        &options(chunk_size, data_chunk_size),
        memory.as_ref(),
    )
    .await
    .unwrap();

    let store: SharedStore = memory;
    restore_db(store, "people").await.unwrap()
}

async fn all_ids(db: &Db, query: Query, sort: Vec<SortSpec>) -> Vec<i64> {
    let mut cursor = db.cursor(query, sort, 0, 100).unwrap();
    let page = cursor.next().await.unwrap();
    page.records.iter().map(|r: &Record| r["id"].as_i64().unwrap()).collect()
}

fn read(root: &Path, path: &str) -> Vec<u8> {
    std::fs::read(root.join(path)).unwrap()
}

// =============================================================================
// Layout Tests
// =============================================================================

/// Five letters, chunk size 2: three shards and a one-spec manifest.
#[tokio::test]
async fn test_five_letters_layout() {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::new(dir.path());
    let source = StaticSource::new(json!([
        {"id": 1, "name": "a"},
        {"id": 2, "name": "b"},
        {"id": 3, "name": "c"},
        {"id": 4, "name": "d"},
        {"id": 5, "name": "e"}
    ]));
    let options = BuildOptions::new("letters", "id")
        .with_normalizer(Normalizer::pointer(""))
        .with_chunk_size(2)
        .with_index(IndexSpec::single("by-name", "name", EngineKind::Simple));

    let report = build_index(&source, &options, &store).await.unwrap();
    assert_eq!(report.records, 5);
    assert_eq!(report.indices[0].shards, 3);

    let table: Value = serde_json::from_slice(&read(dir.path(), "letters/by-name/index.json")).unwrap();
    assert_eq!(table["shards"].as_array().unwrap().len(), 3);
    for seq in 0..3 {
        assert!(dir.path().join(format!("letters/by-name/{}.json", seq)).exists());
    }

    let manifest: Value =
        serde_json::from_slice(&read(dir.path(), "letters/indices.letters.json")).unwrap();
    assert_eq!(manifest["indices"].as_array().unwrap().len(), 1);
    assert_eq!(manifest["indices"][0]["id"], json!("by-name"));

    let shared: SharedStore = Arc::new(store);
    let db = restore_db(shared, "letters").await.unwrap();
    let mut cursor = db.cursor(Query::new().eq("name", "c"), Vec::new(), 0, 10).unwrap();
    let page = cursor.next().await.unwrap();
    assert_eq!(page.records, vec![json!({"id": 3, "name": "c"}).as_object().cloned().unwrap()]);
}

// =============================================================================
// Idempotence Tests
// =============================================================================

/// Same inputs, same bytes: manifest and every shard table.
#[tokio::test]
async fn test_rebuild_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::new(dir.path());
    let options = options(2, 3);

    build_index(&StaticSource::new(people()), &options, &store).await.unwrap();
    let paths = [
        "people/indices.people.json",
        "people/data.people/index.json",
        "people/by-city/index.json",
        "people/by-name/index.json",
        "people/by-bio/index.json",
    ];
    let first: Vec<Vec<u8>> = paths.iter().map(|p| read(dir.path(), p)).collect();

    build_index(&StaticSource::new(people()), &options, &store).await.unwrap();
    let second: Vec<Vec<u8>> = paths.iter().map(|p| read(dir.path(), p)).collect();

    assert_eq!(first, second);
}

/// Source order does not leak into the output.
#[tokio::test]
async fn test_source_order_does_not_matter() {
    let forward = Arc::new(MemoryStore::new());
    let reversed = Arc::new(MemoryStore::new());

    let mut records = people().as_array().cloned().unwrap();
    build_index(&StaticSource::new(Value::Array(records.clone())), &options(2, 2), forward.as_ref())
        .await
        .unwrap();
    records.reverse();
    build_index(&StaticSource::new(Value::Array(records)), &options(2, 2), reversed.as_ref())
        .await
        .unwrap();

    assert_eq!(forward.paths(), reversed.paths());
    for path in forward.paths() {
        assert_eq!(
            forward.object(&path),
            reversed.object(&path),
            "{} differs",
            path
        );
    }
}

// =============================================================================
// Chunk Size Independence Tests
// =============================================================================

/// Every query answers the same for any chunk sizes.
#[tokio::test]
async fn test_results_independent_of_chunk_size() {
    let queries: Vec<(Query, Vec<SortSpec>)> = vec![
        (Query::new(), Vec::new()),
        (Query::new().eq("city", "oslo"), Vec::new()),
        (Query::new().eq("city", "lima"), vec![SortSpec::desc("name")]),
        (Query::new().gte("city", "oslo"), Vec::new()),
        (Query::new().eq("$by-name", "ar"), Vec::new()),
        (Query::new().eq("$by-name", "a"), Vec::new()),
        (Query::new().eq("$by-bio", "static search"), Vec::new()),
        (Query::new().gt("age", 30), vec![SortSpec::asc("age")]),
        (Query::new().eq("age", 29).eq("city", "lima"), Vec::new()),
    ];

    let baseline = build_memory(50, 25).await;
    let mut expected = Vec::new();
    for (query, sort) in &queries {
        expected.push(all_ids(&baseline, query.clone(), sort.clone()).await);
    }

    for (chunk, data_chunk) in [(1, 1), (2, 3), (3, 2), (4, 100)] {
        let db = build_memory(chunk, data_chunk).await;
        for ((query, sort), want) in queries.iter().zip(&expected) {
            let got = all_ids(&db, query.clone(), sort.clone()).await;
            assert_eq!(&got, want, "chunk sizes ({}, {}) query {:?}", chunk, data_chunk, query);
        }
    }

    assert_eq!(expected[0], vec![1, 2, 4, 5, 7, 9]);
    assert_eq!(expected[1], vec![5, 7]);
    assert_eq!(expected[2], vec![9, 2]);
    assert_eq!(expected[3], vec![1, 4, 5, 7]);
    assert_eq!(expected[4], vec![9]);
    assert_eq!(expected[5], vec![1, 2, 7, 9]);
    assert_eq!(expected[6], vec![5, 2, 4, 7]);
    assert_eq!(expected[7], vec![5, 7, 1, 4]);
    assert_eq!(expected[8], vec![2, 9]);
}

// =============================================================================
// Failure Tests
// =============================================================================

/// A record without an identifier aborts before anything is written.
#[tokio::test]
async fn test_missing_identifier_leaves_no_files() {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::new(dir.path());
    let source = StaticSource::new(json!([
        {"id": 1, "name": "a"},
        {"name": "no id"}
    ]));

    let err = build_index(&source, &options(2, 2), &store).await.unwrap_err();
    assert_eq!(err.code(), "CDN_BUILD_RECORD");
    assert!(!dir.path().join("people").exists());
}

/// Source errors abort the build with the source's messages.
#[tokio::test]
async fn test_source_error_aborts() {
    let memory = MemoryStore::new();
    let source = StaticSource::with_response(cdnsearch::record::SourceResponse::failed("boom"));

    let err = build_index(&source, &options(2, 2), &memory).await.unwrap_err();
    assert_eq!(err.code(), "CDN_BUILD_SOURCE");
    assert!(memory.paths().is_empty());
}

/// Unknown engine tags fail at build time.
#[tokio::test]
async fn test_unknown_engine_rejected() {
    let memory = MemoryStore::new();
    let mut spec = IndexSpec::single("by-name", "name", EngineKind::Simple);
    spec.engine = Some("fuzzy".to_string());
    let options = BuildOptions::new("people", "id")
        .with_normalizer(Normalizer::pointer(""))
        .with_index(spec);

    let err = build_index(&StaticSource::new(people()), &options, &memory)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CDN_ENGINE_NOT_FOUND");
    assert!(memory.paths().is_empty());
}
