//! CLI command implementations
//!
//! Each command returns the JSON `data` of its response; `run` wraps it in
//! the response envelope and maps failures to error responses.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::build::{build_if_needed, BuildLedger, BuildOptions, BuildOutcome};
use crate::observability::{init_tracing, Logger};
use crate::record::JsonFileSource;
use crate::schema::{restore_db, Db, Query, SortSpec};
use crate::storage::{LocalStore, SharedStore};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Ledger file name under the store root
pub const LEDGER_FILE: &str = "builds.json";

/// Parse arguments, run the command, print one JSON response.
///
/// Returns the error again after printing it so the caller can exit non-zero.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_tracing();

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to start runtime: {}", e)))?;

    match runtime.block_on(run_command(cli.command)) {
        Ok(data) => write_response(data),
        Err(e) => {
            Logger::error(
                "CLI_COMMAND_FAILED",
                &[("code", e.code_str()), ("message", e.message())],
            );
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Run the appropriate command based on CLI args
pub async fn run_command(cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Build {
            config,
            records,
            out,
            force,
        } => build(&config, &records, &out, force).await,
        Command::Query {
            id,
            root,
            filter,
            sort,
            skip,
            limit,
            all,
        } => {
            let query = match filter {
                Some(text) => parse_filter(&text)?,
                None => Query::new(),
            };
            let sort = match sort {
                Some(text) => SortSpec::parse_list(&text)?,
                None => Vec::new(),
            };
            let db = open(&root, &id).await?;
            query_db(&db, query, sort, skip, limit, all).await
        }
        Command::Text {
            id,
            text,
            root,
            skip,
            limit,
        } => {
            let db = open(&root, &id).await?;
            text_db(&db, &text, skip, limit).await
        }
    }
}

/// Build the indices of an options file, skipping builds the ledger lists
pub async fn build(config: &Path, records: &Path, out: &Path, force: bool) -> CliResult<Value> {
    let options = BuildOptions::load(config)?;
    let source = JsonFileSource::new(records);
    let store = LocalStore::new(out);

    let mut ledger = BuildLedger::open(out.join(LEDGER_FILE)).await?;
    if force && ledger.forget(&options.id) {
        Logger::info("BUILD_FORCED", &[("build_id", options.id.as_str())]);
    }

    let outcome = build_if_needed(&source, &options, &store, &mut ledger).await?;

    Ok(match outcome {
        BuildOutcome::Built(report) => json!({
            "built": true,
            "report": serde_json::to_value(&report)?
        }),
        BuildOutcome::Skipped { build_id } => json!({
            "built": false,
            "buildId": build_id
        }),
    })
}

/// Restore a build from a local store root
pub async fn open(root: &Path, build_id: &str) -> CliResult<Db> {
    let store: SharedStore = Arc::new(LocalStore::new(root));
    Ok(restore_db(store, build_id).await?)
}

fn parse_filter(text: &str) -> CliResult<Query> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CliError::invalid_argument(format!("Invalid --filter JSON: {}", e)))?;
    Ok(Query::from_json(&value)?)
}

/// One page of a filter query, or every page with `all`
pub async fn query_db(
    db: &Db,
    query: Query,
    sort: Vec<SortSpec>,
    skip: usize,
    limit: usize,
    all: bool,
) -> CliResult<Value> {
    let mut cursor = db.cursor(query, sort, skip, limit)?;

    if !all {
        let page = cursor.next().await?;
        cursor.finish();
        return Ok(serde_json::to_value(&page)?);
    }

    let mut records = Vec::new();
    while cursor.has_next() {
        let page = cursor.next().await?;
        records.extend(page.records);
    }
    let total = cursor.total().unwrap_or(records.len());
    cursor.finish();

    Ok(json!({
        "records": records,
        "total": total
    }))
}

/// One page of a full-text query
pub async fn text_db(db: &Db, text: &str, skip: usize, limit: usize) -> CliResult<Value> {
    let mut cursor = db.cursor_text(text, skip, limit)?;
    let page = cursor.next().await?;
    cursor.finish();

    Ok(serde_json::to_value(&page)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_inputs(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        let config = dir.path().join("options.json");
        fs::write(
            &config,
            json!({
                "id": "posts",
                "idAttr": "id",
                "chunkSize": 2,
                "normalizer": { "pointer": "/posts" },
                "indices": [
                    { "id": "by-name", "column": "name", "type": "simple" },
                    { "id": "by-body", "column": "body", "type": "text-lex" }
                ]
            })
            .to_string(),
        )
        .unwrap();

        let records = dir.path().join("records.json");
        fs::write(
            &records,
            json!({
                "data": {
                    "posts": [
                        {"id": 1, "name": "a", "body": "rust search"},
                        {"id": 2, "name": "b", "body": "static search"},
                        {"id": 3, "name": "c", "body": "rust rust"}
                    ]
                }
            })
            .to_string(),
        )
        .unwrap();

        (config, records)
    }

    #[tokio::test]
    async fn test_build_then_query() {
        let dir = TempDir::new().unwrap();
        let (config, records) = write_inputs(&dir);
        let out = dir.path().join("out");

        let built = build(&config, &records, &out, false).await.unwrap();
        assert_eq!(built["built"], json!(true));
        assert_eq!(built["report"]["records"], json!(3));
        assert!(out.join(LEDGER_FILE).exists());

        let db = open(&out, "posts").await.unwrap();
        let page = query_db(&db, parse_filter(r#"{"name":"c"}"#).unwrap(), Vec::new(), 0, 10, false)
            .await
            .unwrap();
        assert_eq!(page["records"], json!([{"id": 3, "name": "c", "body": "rust rust"}]));
        assert_eq!(page["hasNext"], json!(false));
    }

    #[tokio::test]
    async fn test_build_skips_then_forces() {
        let dir = TempDir::new().unwrap();
        let (config, records) = write_inputs(&dir);
        let out = dir.path().join("out");

        build(&config, &records, &out, false).await.unwrap();
        let skipped = build(&config, &records, &out, false).await.unwrap();
        assert_eq!(skipped["built"], json!(false));

        let forced = build(&config, &records, &out, true).await.unwrap();
        assert_eq!(forced["built"], json!(true));
    }

    #[tokio::test]
    async fn test_query_all_pages() {
        let dir = TempDir::new().unwrap();
        let (config, records) = write_inputs(&dir);
        let out = dir.path().join("out");
        build(&config, &records, &out, false).await.unwrap();

        let db = open(&out, "posts").await.unwrap();
        let all = query_db(&db, Query::new(), vec![SortSpec::desc("id")], 0, 2, true)
            .await
            .unwrap();
        let ids: Vec<i64> = all["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(all["total"], json!(3));
    }

    #[tokio::test]
    async fn test_text_query_orders_by_matches() {
        let dir = TempDir::new().unwrap();
        let (config, records) = write_inputs(&dir);
        let out = dir.path().join("out");
        build(&config, &records, &out, false).await.unwrap();

        let db = open(&out, "posts").await.unwrap();
        let page = text_db(&db, "rust search", 0, 10).await.unwrap();
        let ids: Vec<i64> = page["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_open_missing_build() {
        let dir = TempDir::new().unwrap();
        let err = open(dir.path(), "nope").await.unwrap_err();
        assert_eq!(err.code_str(), "CDN_RESTORE_MANIFEST");
    }

    #[test]
    fn test_parse_filter_rejects_garbage() {
        let err = parse_filter("{not json").unwrap_err();
        assert_eq!(err.code_str(), "CDN_CLI_INVALID_ARGUMENT");
    }
}
