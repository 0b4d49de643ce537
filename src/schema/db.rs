//! Query surface over a restored schema

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use super::errors::{QueryError, QueryResult};
use super::filters::PredicateFilter;
use super::query::{Predicate, Query, SortSpec};
use super::schema::Schema;
use super::sorter::ResultSorter;
use crate::cursor::{Cursor, CursorResult};
use crate::record::{Record, RecordId};

/// One page of results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub records: Vec<Record>,
    /// Offset of the first record of this page
    pub skip: usize,
    /// Size of the whole result set
    pub total: usize,
    pub has_next: bool,
}

/// Cheaply cloneable handle to a restored schema
#[derive(Debug, Clone)]
pub struct Db {
    schema: Arc<Schema>,
}

impl Db {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn build_id(&self) -> &str {
        self.schema.build_id()
    }

    /// Number of records in the primary index
    pub fn len(&self) -> usize {
        self.schema.primary().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.primary().is_empty()
    }

    pub fn record(&self, id: &RecordId) -> Option<&Record> {
        self.schema.primary().get(id)
    }

    /// Ordered ids of every record matching `query`.
    ///
    /// Index-backed paths are answered by their index, other paths by
    /// predicate evaluation on primary records. Without sort keys, results
    /// follow the text-match ranking if a full-text index took part, and
    /// identifier order otherwise.
    pub async fn resolve(&self, query: &Query, sort: &[SortSpec]) -> QueryResult<Vec<RecordId>> {
        let primary = self.schema.primary();

        let mut candidates: Option<BTreeSet<RecordId>> = None;
        let mut scores: Option<BTreeMap<RecordId, usize>> = None;
        let mut residual: Vec<&Predicate> = Vec::new();

        for predicate in &query.predicates {
            let hits = match self.schema.index_at(&predicate.path) {
                Some(index) => index.lookup(&predicate.op, primary).await?,
                None if predicate.path.starts_with('$') => {
                    return Err(QueryError::invalid(format!(
                        "no index at path '{}'",
                        predicate.path
                    )))
                }
                None => None,
            };

            let Some(hits) = hits else {
                residual.push(predicate);
                continue;
            };

            if hits.scored {
                let totals = scores.get_or_insert_with(BTreeMap::new);
                for (id, score) in &hits.ids {
                    *totals.entry(id.clone()).or_insert(0) += score;
                }
            }

            let matched: BTreeSet<RecordId> = hits.ids.into_keys().collect();
            candidates = Some(match candidates {
                Some(current) => &current & &matched,
                None => matched,
            });
        }

        let mut ids: Vec<RecordId> = match candidates {
            Some(set) => set.into_iter().filter(|id| primary.contains_key(id)).collect(),
            None => primary.keys().cloned().collect(),
        };

        if !residual.is_empty() {
            ids.retain(|id| {
                primary
                    .get(id)
                    .map(|record| PredicateFilter::matches(record, &residual))
                    .unwrap_or(false)
            });
        }

        if !sort.is_empty() {
            let mut keyed: Vec<(RecordId, Option<&Record>)> = ids
                .into_iter()
                .map(|id| {
                    let record = primary.get(&id);
                    (id, record)
                })
                .collect();
            ResultSorter::sort(&mut keyed, sort, |pair| pair.1);
            ids = keyed.into_iter().map(|(id, _)| id).collect();
        } else if let Some(scores) = scores {
            ids.sort_by(|a, b| {
                let sa = scores.get(a).copied().unwrap_or(0);
                let sb = scores.get(b).copied().unwrap_or(0);
                sb.cmp(&sa)
            });
        }

        Ok(ids)
    }

    /// Query routing `text` to the first full-text index
    pub fn text_query(&self, text: &str) -> QueryResult<Query> {
        let index = self.schema.text_index().ok_or(QueryError::NoTextIndex)?;
        Ok(Query::new().eq(index.path(), text))
    }

    /// All matching records, unpaginated
    pub async fn find(&self, query: &Query, sort: &[SortSpec]) -> QueryResult<Vec<Record>> {
        let ids = self.resolve(query, sort).await?;
        Ok(self.page(&ids, 0, ids.len()).records)
    }

    /// Slice `ids` into a page of records
    pub fn page(&self, ids: &[RecordId], skip: usize, limit: usize) -> Page {
        let total = ids.len();
        let start = skip.min(total);
        let end = skip.saturating_add(limit).min(total);

        Page {
            records: ids[start..end]
                .iter()
                .filter_map(|id| self.record(id).cloned())
                .collect(),
            skip,
            total,
            has_next: end < total,
        }
    }

    /// Paginated cursor over a filtered, sorted query
    pub fn cursor(
        &self,
        query: Query,
        sort: Vec<SortSpec>,
        skip: usize,
        limit: usize,
    ) -> CursorResult<Cursor> {
        Cursor::new(self.clone(), query, sort, skip, limit)
    }

    /// Paginated cursor over a full-text query
    pub fn cursor_text(&self, text: &str, skip: usize, limit: usize) -> CursorResult<Cursor> {
        let query = self.text_query(text)?;
        Cursor::new(self.clone(), query, Vec::new(), skip, limit)
    }
}
