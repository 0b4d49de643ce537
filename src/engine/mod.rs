//! Index engines
//!
//! Closed set of engines selected by an engine-type tag:
//! - `simple`: exact-match on field values
//! - `n-gram`: character n-gram substring lookup
//! - `text-lex`: lowercased word lookup for full-text queries
//!
//! An engine instance lives only for the duration of a build: records are
//! added in source order, then the instance is consumed into key-sorted
//! posting entries for the chunk codec.

mod errors;
mod ngram;
mod postings;
mod simple;
mod spec;
mod textlex;

pub use errors::{EngineError, EngineResult};
pub use ngram::{value_texts, NGramEngine, NGramParams, DEFAULT_GRAM_LEN};
pub use postings::Postings;
pub use simple::SimpleEngine;
pub use spec::{EngineKind, IndexSpec};
pub use textlex::{tokenize, TextLexEngine};

use serde_json::Value;

use crate::record::{IndexKey, Record, RecordId};

/// An index instance under construction
#[derive(Debug)]
pub enum IndexEngine {
    Simple(SimpleEngine),
    NGram(NGramEngine),
    TextLex(TextLexEngine),
}

impl IndexEngine {
    /// Create the engine an `IndexSpec` asks for.
    ///
    /// Fails with `EngineError::NotFound` for unknown engine tags.
    pub fn from_spec(spec: &IndexSpec, default: EngineKind) -> EngineResult<Self> {
        let kind = spec.validate(default)?;
        Ok(match kind {
            EngineKind::Simple => IndexEngine::Simple(SimpleEngine::new()),
            EngineKind::NGram => IndexEngine::NGram(NGramEngine::new(NGramParams::from_spec(spec))),
            EngineKind::TextLex => IndexEngine::TextLex(TextLexEngine::new()),
        })
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            IndexEngine::Simple(_) => EngineKind::Simple,
            IndexEngine::NGram(_) => EngineKind::NGram,
            IndexEngine::TextLex(_) => EngineKind::TextLex,
        }
    }

    /// Index `values` (one per source field) under `id`
    pub fn add(&mut self, id: &RecordId, values: &[&Value]) {
        match self {
            IndexEngine::Simple(engine) => engine.add(id, values),
            IndexEngine::NGram(engine) => engine.add(id, values),
            IndexEngine::TextLex(engine) => engine.add(id, values),
        }
    }

    /// Index a record's values for `fields`; missing fields index nothing
    pub fn add_record(&mut self, id: &RecordId, record: &Record, fields: &[&str]) {
        let values: Vec<&Value> = fields.iter().filter_map(|f| record.get(*f)).collect();
        self.add(id, &values);
    }

    pub fn key_count(&self) -> usize {
        match self {
            IndexEngine::Simple(engine) => engine.key_count(),
            IndexEngine::NGram(engine) => engine.key_count(),
            IndexEngine::TextLex(engine) => engine.key_count(),
        }
    }

    /// Consume into key-sorted posting entries
    pub fn into_entries(self) -> Vec<(IndexKey, Vec<RecordId>)> {
        match self {
            IndexEngine::Simple(engine) => engine.into_entries(),
            IndexEngine::NGram(engine) => engine.into_entries(),
            IndexEngine::TextLex(engine) => engine.into_entries(),
        }
    }
}
