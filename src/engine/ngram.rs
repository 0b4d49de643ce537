//! Token n-gram engine
//!
//! Each field value is normalized (optionally lowercased) and split into
//! overlapping character n-grams. A query is answered by intersecting the
//! posting lists of its own grams; values shorter than the gram length are
//! indexed whole.

use std::collections::BTreeSet;

use serde_json::Value;

use super::postings::Postings;
use super::spec::IndexSpec;
use crate::record::{IndexKey, RecordId};

/// Default n-gram length
pub const DEFAULT_GRAM_LEN: usize = 3;

/// Tuning parameters of an n-gram index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NGramParams {
    pub gram_len: usize,
    pub to_lowercase: bool,
    /// Queries shorter than this (in characters) match nothing
    pub actuation_limit: usize,
}

impl Default for NGramParams {
    fn default() -> Self {
        Self {
            gram_len: DEFAULT_GRAM_LEN,
            to_lowercase: true,
            actuation_limit: DEFAULT_GRAM_LEN,
        }
    }
}

impl NGramParams {
    /// Read parameters from a spec, applying defaults.
    ///
    /// Without an explicit `actuationLimit`, the limit is `gramLen` unless
    /// `actuationLimitAuto` is `false`.
    pub fn from_spec(spec: &IndexSpec) -> Self {
        let gram_len = spec.gram_len.unwrap_or(DEFAULT_GRAM_LEN).max(1);
        let actuation_limit = match (spec.actuation_limit, spec.actuation_limit_auto) {
            (Some(limit), _) => limit,
            (None, Some(false)) => 1,
            (None, _) => gram_len,
        };

        Self {
            gram_len,
            to_lowercase: spec.to_lowcase.unwrap_or(true),
            actuation_limit,
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        if self.to_lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }

    /// Distinct grams of `text`, sorted
    pub fn grams(&self, text: &str) -> Vec<IndexKey> {
        let chars: Vec<char> = self.normalize(text).chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let mut grams = BTreeSet::new();
        if chars.len() <= self.gram_len {
            grams.insert(chars.iter().collect::<String>());
        } else {
            for window in chars.windows(self.gram_len) {
                grams.insert(window.iter().collect::<String>());
            }
        }

        grams.into_iter().map(IndexKey::String).collect()
    }

    /// Whether a query is long enough for the index to answer
    pub fn is_actuated(&self, query: &str) -> bool {
        query.chars().count() >= self.actuation_limit.max(1)
    }

    /// Whether a query is shorter than one gram
    pub fn is_short(&self, query: &str) -> bool {
        query.chars().count() < self.gram_len
    }

    /// Substring check under this index's normalization
    pub fn contains(&self, haystack: &str, needle: &str) -> bool {
        self.normalize(haystack).contains(&self.normalize(needle))
    }
}

/// Text forms of a field value used for gram extraction
pub fn value_texts(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Array(items) => items.iter().flat_map(value_texts).collect(),
        Value::Null | Value::Object(_) => Vec::new(),
    }
}

/// n-gram index under construction
#[derive(Debug)]
pub struct NGramEngine {
    params: NGramParams,
    postings: Postings,
}

impl NGramEngine {
    pub fn new(params: NGramParams) -> Self {
        Self {
            params,
            postings: Postings::new(),
        }
    }

    pub fn add(&mut self, id: &RecordId, values: &[&Value]) {
        for value in values {
            for text in value_texts(value) {
                for gram in self.params.grams(&text) {
                    self.postings.insert(gram, id.clone());
                }
            }
        }
    }

    pub fn key_count(&self) -> usize {
        self.postings.key_count()
    }

    pub fn into_entries(self) -> Vec<(IndexKey, Vec<RecordId>)> {
        self.postings.into_entries()
    }
}
