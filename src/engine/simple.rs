//! Exact-match engine: field value -> ids

use serde_json::Value;

use super::postings::Postings;
use crate::record::{IndexKey, RecordId};

/// Exact-match index over scalar field values
#[derive(Debug, Default)]
pub struct SimpleEngine {
    postings: Postings,
}

impl SimpleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every scalar in `values` (array elements included) under `id`
    pub fn add(&mut self, id: &RecordId, values: &[&Value]) {
        for value in values {
            for key in Self::keys(value) {
                self.postings.insert(key, id.clone());
            }
        }
    }

    /// Keys a value is indexed under, and queried by
    pub fn keys(value: &Value) -> Vec<IndexKey> {
        IndexKey::all_from_json(value)
    }

    pub fn key_count(&self) -> usize {
        self.postings.key_count()
    }

    pub fn into_entries(self) -> Vec<(IndexKey, Vec<RecordId>)> {
        self.postings.into_entries()
    }
}
