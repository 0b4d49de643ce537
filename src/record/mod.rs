//! Records and their sources
//!
//! A record is an arbitrary JSON object. Each build names one identifier
//! field (`idAttr`); its value becomes the record's `RecordId`.

mod key;
mod normalizer;
mod source;

pub use key::{IndexKey, RecordId};
pub use normalizer::{NormalizeFn, Normalizer};
pub use source::{JsonFileSource, RecordSource, SourceResponse, StaticSource};

/// A record: field name -> JSON value
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Extract the identifier of `record` under `id_attr`.
///
/// Returns `None` if the field is missing, null, or not a scalar.
pub fn record_id(record: &Record, id_attr: &str) -> Option<RecordId> {
    record.get(id_attr).and_then(IndexKey::from_json)
}
