//! Schema/Db composition
//!
//! `restore_db` turns a build directory back into a queryable `Db`: the
//! primary data index is restored eagerly, secondary indices lazily. Each
//! secondary index is addressed by a path: the field name for single-field
//! exact-match indices, `$<indexId>` for every other index.

mod db;
mod errors;
mod filters;
mod query;
mod restore;
mod schema;
mod sorter;

pub use db::{Db, Page};
pub use errors::{QueryError, QueryResult, RestoreError, RestoreResult};
pub use filters::PredicateFilter;
pub use query::{FilterOp, Predicate, Query, SortDirection, SortSpec};
pub use restore::restore_db;
pub use schema::{IndexHits, Schema, SecondaryIndex};
pub use sorter::ResultSorter;
