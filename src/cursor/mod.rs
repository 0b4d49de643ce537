//! Cursors
//!
//! Two access modes over a `Db` query:
//! - `Cursor`: caller-driven `next()` / `has_next()` / `finish()`; errors
//!   propagate to the caller
//! - `LiveCursor`: opens itself, publishes `CursorView` state, re-acquires on
//!   parameter change; errors are logged and swallowed
//!
//! A single cursor serializes its own fetches (`next()` takes `&mut self`).
//! `finish()` is idempotent and runs on drop.

mod cursor;
mod errors;
mod live;

pub use cursor::{Cursor, CursorCloser, CursorState, DEFAULT_LIMIT};
pub use errors::{CursorError, CursorResult};
pub use live::{CursorParams, CursorTarget, CursorView, LiveCursor};
