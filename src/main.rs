//! cdnsearch CLI entry point
//!
//! Parsing, dispatch and response output all live in `cli::run`; this only
//! turns a failure into a non-zero exit status.

use cdnsearch::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
