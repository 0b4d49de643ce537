//! Predicate evaluation against primary records
//!
//! Used for paths no secondary index answers. Equality is exact (no type
//! coercion); an array field matches an equality predicate if any element
//! does. Ordering operators compare numbers with numbers and strings with
//! strings only.

use std::cmp::Ordering;

use serde_json::Value;

use super::query::{FilterOp, Predicate};
use crate::record::Record;

/// Evaluates predicates against records
pub struct PredicateFilter;

impl PredicateFilter {
    /// All predicates must match
    pub fn matches(record: &Record, predicates: &[&Predicate]) -> bool {
        predicates
            .iter()
            .all(|pred| Self::matches_predicate(record, pred))
    }

    fn matches_predicate(record: &Record, predicate: &Predicate) -> bool {
        let actual = match record.get(&predicate.path) {
            Some(Value::Null) | None => return false,
            Some(v) => v,
        };

        match &predicate.op {
            FilterOp::Eq(expected) => match actual {
                Value::Array(items) if !expected.is_array() => items.contains(expected),
                _ => actual == expected,
            },
            FilterOp::Gt(bound) => Self::compare(actual, bound) == Some(Ordering::Greater),
            FilterOp::Gte(bound) => matches!(
                Self::compare(actual, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt(bound) => Self::compare(actual, bound) == Some(Ordering::Less),
            FilterOp::Lte(bound) => matches!(
                Self::compare(actual, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }

    /// Same-kind comparison; `None` when the kinds differ
    fn compare(actual: &Value, bound: &Value) -> Option<Ordering> {
        match (actual, bound) {
            (Value::Number(a), Value::Number(b)) => {
                if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                    return Some(ai.cmp(&bi));
                }
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn check(record: &Record, predicate: Predicate) -> bool {
        PredicateFilter::matches(record, &[&predicate])
    }

    #[test]
    fn test_equality_no_coercion() {
        let doc = record(json!({"value": 123, "name": "Alice"}));

        assert!(check(&doc, Predicate::new("name", FilterOp::Eq(json!("Alice")))));
        assert!(!check(&doc, Predicate::new("value", FilterOp::Eq(json!("123")))));
        assert!(check(&doc, Predicate::new("value", FilterOp::Eq(json!(123)))));
    }

    #[test]
    fn test_array_field_contains() {
        let doc = record(json!({"tags": ["rust", "cli"]}));

        assert!(check(&doc, Predicate::new("tags", FilterOp::Eq(json!("cli")))));
        assert!(!check(&doc, Predicate::new("tags", FilterOp::Eq(json!("go")))));
        assert!(check(&doc, Predicate::new("tags", FilterOp::Eq(json!(["rust", "cli"])))));
    }

    #[test]
    fn test_range_predicates() {
        let doc = record(json!({"age": 25, "score": 2.5}));

        assert!(check(&doc, Predicate::new("age", FilterOp::Gte(json!(18)))));
        assert!(check(&doc, Predicate::new("age", FilterOp::Lte(json!(25)))));
        assert!(!check(&doc, Predicate::new("age", FilterOp::Gt(json!(25)))));
        assert!(!check(&doc, Predicate::new("age", FilterOp::Lt(json!(25)))));
        assert!(check(&doc, Predicate::new("score", FilterOp::Gt(json!(2)))));
    }

    #[test]
    fn test_mixed_kinds_never_match() {
        let doc = record(json!({"age": 25}));
        assert!(!check(&doc, Predicate::new("age", FilterOp::Gt(json!("10")))));
    }

    #[test]
    fn test_missing_and_null_never_match() {
        let doc = record(json!({"name": null}));
        assert!(!check(&doc, Predicate::new("name", FilterOp::Eq(json!(null)))));
        assert!(!check(&doc, Predicate::new("age", FilterOp::Eq(json!(30)))));
    }

    #[test]
    fn test_multiple_predicates_and() {
        let doc = record(json!({"age": 25, "active": true}));
        let adult = Predicate::new("age", FilterOp::Gte(json!(18)));
        let inactive = Predicate::new("active", FilterOp::Eq(json!(false)));

        assert!(!PredicateFilter::matches(&doc, &[&adult, &inactive]));
        assert!(PredicateFilter::matches(&doc, &[&adult]));
    }
}
