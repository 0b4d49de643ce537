//! CLI argument definitions using clap
//!
//! Commands:
//! - cdnsearch build --config <options.json> --records <records.json> [--out DIR] [--force]
//! - cdnsearch query --id <buildId> [--root DIR] [--filter JSON] [--sort SPEC] [--skip N] [--limit N] [--all]
//! - cdnsearch text --id <buildId> --text <words> [--root DIR] [--skip N] [--limit N]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cursor::DEFAULT_LIMIT;

/// Default store root for build output
pub const DEFAULT_ROOT: &str = "public/cdn-indice";

/// cdnsearch - sharded static search indices
#[derive(Parser, Debug)]
#[command(name = "cdnsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the indices described by an options file
    Build {
        /// Path to the build options file
        #[arg(long)]
        config: PathBuf,

        /// JSON file answering the build's record query
        #[arg(long)]
        records: PathBuf,

        /// Store root the build is written under
        #[arg(long, default_value = DEFAULT_ROOT)]
        out: PathBuf,

        /// Rebuild even if the ledger lists the build
        #[arg(long)]
        force: bool,
    },

    /// Run a filter query against a build
    Query {
        /// Build id
        #[arg(long)]
        id: String,

        /// Store root the build was written under
        #[arg(long, default_value = DEFAULT_ROOT)]
        root: PathBuf,

        /// Query as JSON, e.g. '{"name":"c"}' or '{"age":{"$gte":30}}'
        #[arg(long)]
        filter: Option<String>,

        /// Sort fields, e.g. 'name,age:desc'
        #[arg(long)]
        sort: Option<String>,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Page through the whole result set
        #[arg(long)]
        all: bool,
    },

    /// Run a full-text query against a build's text index
    Text {
        /// Build id
        #[arg(long)]
        id: String,

        /// Words to look up
        #[arg(long)]
        text: String,

        /// Store root the build was written under
        #[arg(long, default_value = DEFAULT_ROOT)]
        root: PathBuf,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
