//! Observability for cdnsearch
//!
//! - Structured, single-line JSON events (`Logger`)
//! - Begin/complete scopes around builds and restores (`ObservationScope`)
//! - `init_tracing` installs the subscriber for the CLI
//!
//! Observability never changes execution: logging has no return value and
//! never fails the caller.

mod logger;
mod scope;

pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber writing to stderr.
///
/// Honors `RUST_LOG`, defaulting to `info`. Calling it more than once is a
/// no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
