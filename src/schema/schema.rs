//! Runtime schema: the eagerly restored primary index plus lazily restored
//! secondary indices, each addressed by its storage path.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use futures_util::future::try_join_all;
use serde_json::Value;

use super::errors::{QueryError, QueryResult, RestoreResult};
use super::query::FilterOp;
use crate::codec::LazyIndex;
use crate::engine::{tokenize, value_texts, EngineKind, IndexSpec, NGramParams};
use crate::record::{IndexKey, Record, RecordId};

/// Ids an index matched, with per-id scores for ranked engines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexHits {
    pub ids: BTreeMap<RecordId, usize>,
    /// Whether scores carry a ranking
    pub scored: bool,
}

impl IndexHits {
    fn unscored(ids: impl IntoIterator<Item = RecordId>) -> Self {
        Self {
            ids: ids.into_iter().map(|id| (id, 0)).collect(),
            scored: false,
        }
    }
}

/// A restored secondary index
#[derive(Debug)]
pub struct SecondaryIndex {
    spec: IndexSpec,
    kind: EngineKind,
    path: String,
    handle: LazyIndex<Vec<RecordId>>,
}

impl SecondaryIndex {
    /// Wrap a lazy handle; the index's engine tag must be known
    pub fn new(spec: IndexSpec, handle: LazyIndex<Vec<RecordId>>) -> RestoreResult<Self> {
        let kind = spec.engine_kind(EngineKind::Simple)?;
        let path = spec.storage_path()?;
        Ok(Self {
            spec,
            kind,
            path,
            handle,
        })
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    /// Address used by queries
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handle(&self) -> &LazyIndex<Vec<RecordId>> {
        &self.handle
    }

    fn unsupported(&self, op: &FilterOp) -> QueryError {
        QueryError::Unsupported {
            path: self.path.clone(),
            op: format!("{} on {}", op.name(), op.value()),
        }
    }

    async fn get(&self, key: &IndexKey) -> QueryResult<Vec<RecordId>> {
        self.handle
            .get(key)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| QueryError::shard(self.id(), e))
    }

    async fn get_all(&self, keys: &[IndexKey]) -> QueryResult<Vec<Vec<RecordId>>> {
        try_join_all(keys.iter().map(|key| self.get(key))).await
    }

    async fn range(
        &self,
        lower: Bound<&IndexKey>,
        upper: Bound<&IndexKey>,
    ) -> QueryResult<Vec<(IndexKey, Vec<RecordId>)>> {
        self.handle
            .range(lower, upper)
            .await
            .map_err(|e| QueryError::shard(self.id(), e))
    }

    /// Answer one condition.
    ///
    /// `Ok(None)` means the index cannot answer but its path is a plain
    /// field, so the condition can be evaluated against primary records.
    pub async fn lookup(
        &self,
        op: &FilterOp,
        primary: &BTreeMap<RecordId, Record>,
    ) -> QueryResult<Option<IndexHits>> {
        match self.kind {
            EngineKind::Simple => self.lookup_simple(op).await,
            EngineKind::NGram => self.lookup_ngram(op, primary).await.map(Some),
            EngineKind::TextLex => self.lookup_text(op).await.map(Some),
        }
    }

    /// Exact match; array operands match any element. String bounds are
    /// answered by a key range scan restricted to string keys.
    async fn lookup_simple(&self, op: &FilterOp) -> QueryResult<Option<IndexHits>> {
        let floor = IndexKey::from_string("");

        let (lower, upper) = match op {
            FilterOp::Eq(value) => {
                let keys = IndexKey::all_from_json(value);
                let found = self.get_all(&keys).await?;
                return Ok(Some(IndexHits::unscored(found.into_iter().flatten())));
            }
            FilterOp::Gt(Value::String(s)) => {
                (Bound::Excluded(IndexKey::from_string(s)), Bound::Unbounded)
            }
            FilterOp::Gte(Value::String(s)) => {
                (Bound::Included(IndexKey::from_string(s)), Bound::Unbounded)
            }
            FilterOp::Lt(Value::String(s)) => {
                (Bound::Included(floor), Bound::Excluded(IndexKey::from_string(s)))
            }
            FilterOp::Lte(Value::String(s)) => {
                (Bound::Included(floor), Bound::Included(IndexKey::from_string(s)))
            }
            _ if self.spec.column.is_some() => return Ok(None),
            other => return Err(self.unsupported(other)),
        };

        let entries = self.range(lower.as_ref(), upper.as_ref()).await?;
        Ok(Some(IndexHits::unscored(
            entries.into_iter().flat_map(|(_, ids)| ids),
        )))
    }

    /// Substring match over the indexed fields
    async fn lookup_ngram(
        &self,
        op: &FilterOp,
        primary: &BTreeMap<RecordId, Record>,
    ) -> QueryResult<IndexHits> {
        let needle = match op {
            FilterOp::Eq(Value::String(s)) => s,
            other => return Err(self.unsupported(other)),
        };

        let params = NGramParams::from_spec(&self.spec);
        if !params.is_actuated(needle) {
            return Ok(IndexHits::default());
        }

        let candidates: BTreeSet<RecordId> = if params.is_short(needle) {
            // shorter than a gram: any gram containing the needle, which
            // also covers values indexed whole
            let normalized = params.normalize(needle);
            self.range(Bound::Unbounded, Bound::Unbounded)
                .await?
                .into_iter()
                .filter(|(key, _)| matches!(key, IndexKey::String(s) if s.contains(&normalized)))
                .flat_map(|(_, ids)| ids)
                .collect()
        } else {
            let grams = params.grams(needle);
            let postings = self.get_all(&grams).await?;
            let mut sets = postings
                .into_iter()
                .map(|ids| ids.into_iter().collect::<BTreeSet<_>>());
            match sets.next() {
                Some(first) => sets.fold(first, |acc, set| &acc & &set),
                None => BTreeSet::new(),
            }
        };

        let fields = self.spec.fields();
        let verified = candidates.into_iter().filter(|id| {
            let Some(record) = primary.get(id) else {
                return false;
            };
            let texts: Vec<String> = fields
                .iter()
                .filter_map(|f| record.get(*f))
                .flat_map(value_texts)
                .collect();
            // fields projected out of the primary index cannot be verified
            texts.is_empty() || texts.iter().any(|t| params.contains(t, needle))
        });

        Ok(IndexHits::unscored(verified))
    }

    /// Any-token match, scored by the number of distinct tokens matched
    async fn lookup_text(&self, op: &FilterOp) -> QueryResult<IndexHits> {
        let text = match op {
            FilterOp::Eq(Value::String(s)) => s,
            other => return Err(self.unsupported(other)),
        };

        let keys: Vec<IndexKey> = tokenize(text).into_iter().map(IndexKey::String).collect();
        let postings = self.get_all(&keys).await?;

        let mut ids = BTreeMap::new();
        for id in postings.into_iter().flatten() {
            *ids.entry(id).or_insert(0) += 1;
        }

        Ok(IndexHits { ids, scored: true })
    }
}

/// Primary index plus secondary indices of one build
#[derive(Debug)]
pub struct Schema {
    build_id: String,
    id_attr: String,
    primary: BTreeMap<RecordId, Record>,
    indices: Vec<SecondaryIndex>,
}

impl Schema {
    pub fn new(
        build_id: impl Into<String>,
        id_attr: impl Into<String>,
        primary: BTreeMap<RecordId, Record>,
        indices: Vec<SecondaryIndex>,
    ) -> Self {
        Self {
            build_id: build_id.into(),
            id_attr: id_attr.into(),
            primary,
            indices,
        }
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    pub fn id_attr(&self) -> &str {
        &self.id_attr
    }

    pub fn primary(&self) -> &BTreeMap<RecordId, Record> {
        &self.primary
    }

    pub fn indices(&self) -> &[SecondaryIndex] {
        &self.indices
    }

    /// Index by id
    pub fn index(&self, id: &str) -> Option<&SecondaryIndex> {
        self.indices.iter().find(|i| i.id() == id)
    }

    /// Index answering queries at `path`; the first declared wins
    pub fn index_at(&self, path: &str) -> Option<&SecondaryIndex> {
        self.indices.iter().find(|i| i.path() == path)
    }

    /// First full-text index
    pub fn text_index(&self) -> Option<&SecondaryIndex> {
        self.indices.iter().find(|i| i.kind() == EngineKind::TextLex)
    }
}
