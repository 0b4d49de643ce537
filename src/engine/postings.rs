//! BTreeMap-based posting lists
//!
//! `BTreeMap<IndexKey, Vec<RecordId>>` for deterministic ordering.
//! Ids under a key are kept sorted ascending and unique.

use std::collections::BTreeMap;

use crate::record::{IndexKey, RecordId};

/// Key -> sorted record ids
#[derive(Debug, Default, Clone)]
pub struct Postings {
    tree: BTreeMap<IndexKey, Vec<RecordId>>,
}

impl Postings {
    /// Creates an empty posting map
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Insert an id for a key, keeping ids sorted and unique.
    pub fn insert(&mut self, key: IndexKey, id: RecordId) {
        let ids = self.tree.entry(key).or_default();

        match ids.binary_search(&id) {
            Ok(_) => {}
            Err(pos) => ids.insert(pos, id),
        }
    }

    /// Ids for an exact key, sorted ascending
    pub fn lookup_eq(&self, key: &IndexKey) -> Vec<RecordId> {
        self.tree.get(key).cloned().unwrap_or_default()
    }

    /// Returns the number of distinct keys
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Consume into key-sorted entries
    pub fn into_entries(self) -> Vec<(IndexKey, Vec<RecordId>)> {
        self.tree.into_iter().collect()
    }
}
