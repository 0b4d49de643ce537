//! Lexical text engine: lowercased word token -> ids

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::ngram::value_texts;
use super::postings::Postings;
use crate::record::{IndexKey, RecordId};

static WORD: OnceLock<Regex> = OnceLock::new();

fn word_pattern() -> &'static Regex {
    WORD.get_or_init(|| Regex::new(r"\w+").expect("word pattern is a valid regex"))
}

/// Distinct lowercased word tokens of `text`, in first-seen order
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut tokens = Vec::new();

    for m in word_pattern().find_iter(text) {
        let token = m.as_str().to_lowercase();
        if seen.insert(token.clone()) {
            tokens.push(token);
        }
    }

    tokens
}

/// Word index under construction
#[derive(Debug, Default)]
pub struct TextLexEngine {
    postings: Postings,
}

impl TextLexEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: &RecordId, values: &[&Value]) {
        for value in values {
            for text in value_texts(value) {
                for token in tokenize(&text) {
                    self.postings.insert(IndexKey::String(token), id.clone());
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
