//! CLI module for cdnsearch
//!
//! - build: run a build from an options file and a records file
//! - query: one page (or all pages) of a filter query
//! - text: one page of a full-text query

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, DEFAULT_ROOT};
pub use commands::{build, open, query_db, run, run_command, text_db, LEDGER_FILE};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
