//! Live Cursor Tests
//!
//! Tests for the self-driven cursor over a filesystem store:
//! - Switching builds restores the new build and replaces accumulated state
//! - Fetch failures in either variant keep the published view
//! - Subscribers observe every published change

use std::sync::Arc;

use cdnsearch::build::{build_index, BuildOptions};
use cdnsearch::cursor::{CursorParams, LiveCursor};
use cdnsearch::engine::{EngineKind, IndexSpec};
use cdnsearch::record::{Normalizer, Record, StaticSource};
use cdnsearch::schema::Query;
use cdnsearch::storage::{LocalStore, SharedStore};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

async fn build(dir: &TempDir, id: &str, records: Value) {
    let options = BuildOptions::new(id, "id")
        .with_normalizer(Normalizer::pointer(""))
        .with_chunk_size(1)
        .with_index(IndexSpec::single("by-kind", "kind", EngineKind::Simple))
        .with_index(IndexSpec::single("by-text", "text", EngineKind::TextLex));
    build_index(&StaticSource::new(records), &options, &LocalStore::new(dir.path()))
        .await
        .unwrap();
}

async fn two_builds() -> (TempDir, SharedStore) {
    let dir = TempDir::new().unwrap();
    build(
        &dir,
        "v1",
        json!([
            {"id": 1, "kind": "post", "text": "first post"},
            {"id": 2, "kind": "page", "text": "about page"},
            {"id": 3, "kind": "post", "text": "second post"}
        ]),
    )
    .await;
    build(
        &dir,
        "v2",
        json!([
            {"id": 10, "kind": "post", "text": "rewritten post"},
            {"id": 11, "kind": "post", "text": "another post"}
        ]),
    )
    .await;

    let store: SharedStore = Arc::new(LocalStore::new(dir.path()));
    (dir, store)
}

fn ids(records: &[Record]) -> Vec<i64> {
    records.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

fn posts(build_id: &str) -> CursorParams {
    CursorParams::filter(build_id, Query::new().eq("kind", "post"), Vec::new()).with_limit(1)
}

// =============================================================================
// Acquisition Tests
// =============================================================================

#[tokio::test]
async fn test_pages_accumulate() {
    let (_dir, store) = two_builds().await;
    let mut live = LiveCursor::open(store, posts("v1")).await;
    assert_eq!(ids(&live.view().all), vec![1]);

    live.next().await;
    let view = live.view();
    assert_eq!(ids(&view.page), vec![3]);
    assert_eq!(ids(&view.all), vec![1, 3]);
    assert!(!view.has_next);

    // exhausted: nothing changes
    live.next().await;
    assert_eq!(live.view(), view);
}

#[tokio::test]
async fn test_switching_build_restores_new_build() {
    let (_dir, store) = two_builds().await;
    let mut live = LiveCursor::open(store, posts("v1")).await;
    live.next().await;

    live.set_params(posts("v2")).await;
    let view = live.view();
    assert_eq!(ids(&view.page), vec![10]);
    assert_eq!(ids(&view.all), vec![10]);
    assert!(view.has_next);
}

#[tokio::test]
async fn test_skip_change_reacquires() {
    let (_dir, store) = two_builds().await;
    let mut live = LiveCursor::open(store, posts("v1")).await;

    live.set_params(posts("v1").with_skip(1)).await;
    assert_eq!(ids(&live.view().all), vec![3]);
}

#[tokio::test]
async fn test_subscriber_sees_updates() {
    let (_dir, store) = two_builds().await;
    let mut live = LiveCursor::open(store, posts("v1")).await;
    let mut rx = live.subscribe();
    let _ = rx.borrow_and_update();

    live.next().await;
    assert!(rx.has_changed().unwrap());
    let view = rx.borrow_and_update().clone();
    assert_eq!(ids(&view.all), vec![1, 3]);
    assert!(!view.fetching);
}

// =============================================================================
// Failure Tests
// =============================================================================

/// A filter fetch failure keeps page, all and has_next.
#[tokio::test]
async fn test_filter_failure_keeps_view() {
    let (dir, store) = two_builds().await;
    let mut live = LiveCursor::open(store, posts("v1")).await;
    let before = live.view();

    // chunk size 1: one key per shard, "page" < "post"
    std::fs::remove_file(dir.path().join("v1/by-kind/0.json")).unwrap();
    live.set_params(CursorParams::filter("v1", Query::new().eq("kind", "page"), Vec::new()))
        .await;

    let after = live.view();
    assert_eq!(after.page, before.page);
    assert_eq!(after.all, before.all);
    assert_eq!(after.has_next, before.has_next);
    assert!(!after.fetching);
}

/// A full-text fetch failure behaves the same way.
#[tokio::test]
async fn test_text_failure_keeps_view() {
    let (dir, store) = two_builds().await;
    let mut live = LiveCursor::open(store, CursorParams::text("v1", "post")).await;
    let before = live.view();
    assert_eq!(ids(&before.all), vec![1, 3]);

    for entry in std::fs::read_dir(dir.path().join("v1/by-text")).unwrap() {
        let path = entry.unwrap().path();
        if path.file_name().unwrap() != "index.json" {
            std::fs::remove_file(path).unwrap();
        }
    }
    live.set_params(CursorParams::text("v1", "about")).await;

    let after = live.view();
    assert_eq!(after.all, before.all);
    assert_eq!(after.has_next, before.has_next);
    assert!(!after.fetching);
}

/// Switching to a missing build is logged; the old view stays.
#[tokio::test]
async fn test_missing_build_keeps_view() {
    let (_dir, store) = two_builds().await;
    let mut live = LiveCursor::open(store, posts("v1")).await;
    let before = live.view();

    live.set_params(posts("v9")).await;
    assert!(live.cursor().is_none());
    assert_eq!(live.view().all, before.all);
    assert!(!live.view().fetching);

    // recovering to a valid build works again
    live.set_params(posts("v2")).await;
    assert_eq!(ids(&live.view().all), vec![10]);
}
