//! Result sorting
//!
//! Stable multi-key sort over records. Ordering between kinds:
//! missing < null < bool < number < string < array < object.

use std::cmp::Ordering;

use serde_json::Value;

use super::query::{SortDirection, SortSpec};
use crate::record::Record;

/// Sorts records by sort keys
pub struct ResultSorter;

impl ResultSorter {
    /// Sort `items` in place; ties keep their incoming order
    pub fn sort<T>(items: &mut [T], specs: &[SortSpec], record: impl Fn(&T) -> Option<&Record>) {
        if specs.is_empty() {
            return;
        }

        items.sort_by(|a, b| {
            let (ra, rb) = (record(a), record(b));
            for spec in specs {
                let va = ra.and_then(|r| r.get(&spec.field));
                let vb = rb.and_then(|r| r.get(&spec.field));

                let ordering = match spec.direction {
                    SortDirection::Asc => Self::compare_values(va, vb),
                    SortDirection::Desc => Self::compare_values(va, vb).reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a_val), Some(b_val)) => {
                let type_order = |v: &Value| -> u8 {
                    match v {
                        Value::Null => 0,
                        Value::Bool(_) => 1,
                        Value::Number(_) => 2,
                        Value::String(_) => 3,
                        Value::Array(_) => 4,
                        Value::Object(_) => 5,
                    }
                };

                match (a_val, b_val) {
                    (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
                    (Value::Number(x), Value::Number(y)) => {
                        let xf = x.as_f64().unwrap_or(0.0);
                        let yf = y.as_f64().unwrap_or(0.0);
                        xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
                    }
                    (Value::String(x), Value::String(y)) => x.cmp(y),
                    _ => type_order(a_val).cmp(&type_order(b_val)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_sort_ascending_and_descending() {
        let mut records = docs(vec![
            json!({"name": "c", "age": 30}),
            json!({"name": "a", "age": 20}),
            json!({"name": "b", "age": 25}),
        ]);

        ResultSorter::sort(&mut records, &[SortSpec::asc("age")], |r| Some(r));
        assert_eq!(names(&records), vec!["a", "b", "c"]);

        ResultSorter::sort(&mut records, &[SortSpec::desc("age")], |r| Some(r));
        assert_eq!(names(&records), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_stable_and_multi_key() {
        let mut records = docs(vec![
            json!({"name": "x", "team": "b", "age": 1}),
            json!({"name": "y", "team": "a", "age": 2}),
            json!({"name": "z", "team": "a", "age": 2}),
            json!({"name": "w", "team": "a", "age": 1}),
        ]);

        ResultSorter::sort(
            &mut records,
            &[SortSpec::asc("team"), SortSpec::desc("age")],
            |r| Some(r),
        );
        assert_eq!(names(&records), vec!["y", "z", "w", "x"]);
    }

    #[test]
    fn test_missing_fields_sort_first() {
        let mut records = docs(vec![json!({"name": "has", "age": 1}), json!({"name": "none"})]);

        ResultSorter::sort(&mut records, &[SortSpec::asc("age")], |r| Some(r));
        assert_eq!(names(&records), vec!["none", "has"]);
    }
}
