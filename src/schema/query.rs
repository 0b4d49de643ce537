//! Query and sort model
//!
//! JSON form of a query: an object of `path -> condition`, where a
//! condition is either a plain value (equality) or an operator object:
//! ```json
//! { "name": "c", "age": { "$gte": 18, "$lt": 65 }, "$by-title": "rust" }
//! ```
//!
//! All predicates are ANDed.

use std::fmt;

use serde_json::Value;

use super::errors::{QueryError, QueryResult};

/// Comparison applied at a path
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
}

impl FilterOp {
    /// Operator name as written in queries
    pub fn name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "$eq",
            FilterOp::Gt(_) => "$gt",
            FilterOp::Gte(_) => "$gte",
            FilterOp::Lt(_) => "$lt",
            FilterOp::Lte(_) => "$lte",
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            FilterOp::Eq(v)
            | FilterOp::Gt(v)
            | FilterOp::Gte(v)
            | FilterOp::Lt(v)
            | FilterOp::Lte(v) => v,
        }
    }

    fn from_operator(name: &str, value: Value) -> QueryResult<Self> {
        match name {
            "$eq" => Ok(FilterOp::Eq(value)),
            "$gt" => Ok(FilterOp::Gt(value)),
            "$gte" => Ok(FilterOp::Gte(value)),
            "$lt" => Ok(FilterOp::Lt(value)),
            "$lte" => Ok(FilterOp::Lte(value)),
            other => Err(QueryError::invalid(format!("unknown operator '{}'", other))),
        }
    }
}

/// One condition on one path
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Field name, or `$<indexId>` for indices not addressed by a field
    pub path: String,
    pub op: FilterOp,
}

impl Predicate {
    pub fn new(path: impl Into<String>, op: FilterOp) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }
}

/// Conjunction of predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
}

impl Query {
    /// The empty query matches every record
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, FilterOp::Eq(value.into()))
    }

    pub fn gt(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, FilterOp::Gt(value.into()))
    }

    pub fn gte(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, FilterOp::Gte(value.into()))
    }

    pub fn lt(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, FilterOp::Lt(value.into()))
    }

    pub fn lte(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(path, FilterOp::Lte(value.into()))
    }

    pub fn with(mut self, path: impl Into<String>, op: FilterOp) -> Self {
        self.predicates.push(Predicate::new(path, op));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Parse the JSON object form.
    ///
    /// An object condition is an operator object only if all its keys start
    /// with `$`; otherwise it is compared for equality as a whole.
    pub fn from_json(value: &Value) -> QueryResult<Self> {
        let object = match value {
            Value::Null => return Ok(Query::new()),
            Value::Object(map) => map,
            other => {
                return Err(QueryError::invalid(format!(
                    "query must be an object, got {}",
                    other
                )))
            }
        };

        let mut query = Query::new();
        for (path, condition) in object {
            match condition {
                Value::Object(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
                    for (name, operand) in ops {
                        query = query.with(path, FilterOp::from_operator(name, operand.clone())?);
                    }
                }
                other => query = query.eq(path, other.clone()),
            }
        }

        Ok(query)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `field[:asc|:desc],...`; direction defaults to ascending
    pub fn parse_list(input: &str) -> QueryResult<Vec<SortSpec>> {
        input
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once(':') {
                None => Ok(SortSpec::asc(part)),
                Some((field, "asc")) if !field.is_empty() => Ok(SortSpec::asc(field)),
                Some((field, "desc")) if !field.is_empty() => Ok(SortSpec::desc(field)),
                Some(_) => Err(QueryError::invalid(format!("bad sort key '{}'", part))),
            })
            .collect()
    }

    /// Parse the JSON object form `{"field": "asc" | "desc" | 1 | -1}`.
    ///
    /// Keys are applied in the object's key order.
    pub fn from_json(value: &Value) -> QueryResult<Vec<SortSpec>> {
        let object = match value {
            Value::Null => return Ok(Vec::new()),
            Value::Object(map) => map,
            other => {
                return Err(QueryError::invalid(format!(
                    "sort must be an object, got {}",
                    other
                )))
            }
        };

        object
            .iter()
            .map(|(field, direction)| match direction {
                Value::String(s) if s == "asc" => Ok(SortSpec::asc(field)),
                Value::String(s) if s == "desc" => Ok(SortSpec::desc(field)),
                Value::Number(n) if n.as_i64() == Some(1) => Ok(SortSpec::asc(field)),
                Value::Number(n) if n.as_i64() == Some(-1) => Ok(SortSpec::desc(field)),
                other => Err(QueryError::invalid(format!(
                    "bad direction {} for '{}'",
                    other, field
                ))),
            })
            .collect()
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction.as_str())
    }
}
