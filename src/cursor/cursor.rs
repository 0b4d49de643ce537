//! Stateless (caller-driven) cursor
//!
//! State machine:
//! ```text
//! Idle --next--> Fetching --ok--> Ready --next--> Fetching ...
//!                   |--err--> previous state
//! any --finish--> Closed
//! ```
//!
//! The result set is resolved on the first `next()` and kept for the
//! cursor's lifetime; later pages are slices of it. `finish()` releases the
//! Db handle (and with the last handle, every decoded shard).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use super::errors::{CursorError, CursorResult};
use crate::observability::Logger;
use crate::record::RecordId;
use crate::schema::{Db, Page, Query, SortSpec};

/// Page size used when none is given
pub const DEFAULT_LIMIT: usize = 30;

/// Cursor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Idle,
    Fetching,
    Ready,
    Closed,
}

/// Handle that can finish a cursor from elsewhere.
///
/// Closing does not abort an in-flight `next()`: that call completes and
/// returns its page, after which the cursor is closed.
#[derive(Debug, Clone)]
pub struct CursorCloser {
    id: Uuid,
    closed: Arc<AtomicBool>,
}

impl CursorCloser {
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            Logger::trace(
                "CURSOR_CLOSE_REQUESTED",
                &[("cursor_id", self.id.to_string().as_str())],
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Paginated cursor over one query
#[derive(Debug)]
pub struct Cursor {
    id: Uuid,
    db: Option<Db>,
    query: Query,
    sort: Vec<SortSpec>,
    skip: usize,
    limit: usize,
    state: CursorState,
    closed: Arc<AtomicBool>,
    results: Option<Vec<RecordId>>,
    page: Page,
}

impl Cursor {
    pub(crate) fn new(
        db: Db,
        query: Query,
        sort: Vec<SortSpec>,
        skip: usize,
        limit: usize,
    ) -> CursorResult<Self> {
        if limit == 0 {
            return Err(CursorError::InvalidLimit);
        }

        let cursor = Self {
            id: Uuid::new_v4(),
            db: Some(db),
            query,
            sort,
            skip,
            limit,
            state: CursorState::Idle,
            closed: Arc::new(AtomicBool::new(false)),
            results: None,
            page: Page::default(),
        };

        Logger::trace(
            "CURSOR_OPENED",
            &[
                ("cursor_id", cursor.id.to_string().as_str()),
                ("skip", skip.to_string().as_str()),
                ("limit", limit.to_string().as_str()),
            ],
        );

        Ok(cursor)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> CursorState {
        if self.closed.load(Ordering::Acquire) {
            CursorState::Closed
        } else {
            self.state
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state() == CursorState::Closed
    }

    /// Offset of the next page
    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Last page returned by `next()`
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Size of the result set, once known
    pub fn total(&self) -> Option<usize> {
        self.results.as_ref().map(Vec::len)
    }

    /// Whether another `next()` can return records.
    ///
    /// Before the first fetch the answer is unknown and reported as `true`.
    pub fn has_next(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.total() {
            Some(total) => self.skip < total,
            None => true,
        }
    }

    pub fn closer(&self) -> CursorCloser {
        CursorCloser {
            id: self.id,
            closed: self.closed.clone(),
        }
    }

    /// Fetch the next page and advance `skip` past it
    pub async fn next(&mut self) -> CursorResult<Page> {
        if self.is_closed() {
            self.finish();
            return Err(CursorError::Closed(self.id.to_string()));
        }
        let db = match &self.db {
            Some(db) => db.clone(),
            None => return Err(CursorError::Closed(self.id.to_string())),
        };

        let previous = self.state;
        self.state = CursorState::Fetching;

        let ids = match self.results.take() {
            Some(ids) => ids,
            None => match db.resolve(&self.query, &self.sort).await {
                Ok(ids) => ids,
                Err(e) => {
                    self.state = previous;
                    Logger::warn(
                        "CURSOR_FETCH_FAILED",
                        &[
                            ("cursor_id", self.id.to_string().as_str()),
                            ("code", e.code()),
                            ("reason", e.to_string().as_str()),
                        ],
                    );
                    return Err(e.into());
                }
            },
        };

        let page = db.page(&ids, self.skip, self.limit);
        self.skip += page.records.len();
        self.results = Some(ids);
        self.page = page.clone();
        self.state = CursorState::Ready;

        Logger::trace(
            "CURSOR_FETCHED",
            &[
                ("cursor_id", self.id.to_string().as_str()),
                ("count", page.records.len().to_string().as_str()),
                ("total", page.total.to_string().as_str()),
            ],
        );

        // closed while fetching: hand out this page, then close
        if self.closed.load(Ordering::Acquire) {
            self.finish();
        }

        Ok(page)
    }

    /// Close the cursor and release its Db handle. Idempotent.
    pub fn finish(&mut self) {
        if self.state == CursorState::Closed {
            return;
        }

        self.state = CursorState::Closed;
        self.closed.store(true, Ordering::Release);
        self.db = None;
        self.results = None;

        Logger::trace("CURSOR_FINISHED", &[("cursor_id", self.id.to_string().as_str())]);
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.finish();
    }
}
