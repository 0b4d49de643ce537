//! Stateful (self-driven) cursor
//!
//! A `LiveCursor` owns its cursor for as long as its parameters stay the
//! same. Opening it restores the build and fetches the first page; every
//! parameter change finishes the current cursor and acquires a new one;
//! dropping it finishes the cursor. Its running state is published through
//! a `watch` channel.
//!
//! Failures are logged at ERROR and never surface to the caller: the
//! published `page`, `all` and `has_next` keep their previous values and
//! `fetching` drops back to `false`.

use serde::Serialize;
use tokio::sync::watch;

use super::cursor::{Cursor, DEFAULT_LIMIT};
use crate::observability::Logger;
use crate::record::Record;
use crate::schema::{restore_db, Db, Query, SortSpec};
use crate::storage::SharedStore;

/// What a live cursor queries
#[derive(Debug, Clone, PartialEq)]
pub enum CursorTarget {
    Filter { query: Query, sort: Vec<SortSpec> },
    /// Routed to the build's first text-lex index
    Text(String),
}

impl CursorTarget {
    fn variant(&self) -> &'static str {
        match self {
            CursorTarget::Filter { .. } => "filter",
            CursorTarget::Text(_) => "text",
        }
    }
}

/// Parameters whose change re-acquires the cursor
#[derive(Debug, Clone, PartialEq)]
pub struct CursorParams {
    pub build_id: String,
    pub target: CursorTarget,
    pub skip: usize,
    pub limit: usize,
}

impl CursorParams {
    pub fn filter(build_id: impl Into<String>, query: Query, sort: Vec<SortSpec>) -> Self {
        Self {
            build_id: build_id.into(),
            target: CursorTarget::Filter { query, sort },
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn text(build_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            build_id: build_id.into(),
            target: CursorTarget::Text(text.into()),
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Observable state of a live cursor
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorView {
    /// Last fetched page
    pub page: Vec<Record>,
    /// Every record fetched since the cursor was acquired
    pub all: Vec<Record>,
    pub fetching: bool,
    pub has_next: bool,
}

/// Self-driving cursor with published state
#[derive(Debug)]
pub struct LiveCursor {
    store: SharedStore,
    params: CursorParams,
    db: Option<Db>,
    cursor: Option<Cursor>,
    /// Next successful page replaces `all` instead of extending it
    fresh: bool,
    view: watch::Sender<CursorView>,
}

impl LiveCursor {
    /// Restore the build, open a cursor and fetch its first page
    pub async fn open(store: SharedStore, params: CursorParams) -> Self {
        let (view, _) = watch::channel(CursorView::default());
        let mut live = Self {
            store,
            params,
            db: None,
            cursor: None,
            fresh: true,
            view,
        };

        live.acquire(true).await;
        live
    }

    pub fn params(&self) -> &CursorParams {
        &self.params
    }

    /// Snapshot of the published state
    pub fn view(&self) -> CursorView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CursorView> {
        self.view.subscribe()
    }

    /// The cursor currently held, if acquisition succeeded
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Replace the parameters; any change re-acquires the cursor.
    ///
    /// The build is restored again only when the build id changed.
    pub async fn set_params(&mut self, params: CursorParams) {
        if params == self.params {
            return;
        }

        let restore = params.build_id != self.params.build_id;
        self.params = params;
        self.acquire(restore).await;
    }

    /// Fetch one more page, appending it to `all`
    pub async fn next(&mut self) {
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };
        if !cursor.has_next() {
            return;
        }

        self.view.send_modify(|v| v.fetching = true);

        match cursor.next().await {
            Ok(page) => {
                let fresh = std::mem::replace(&mut self.fresh, false);
                self.view.send_modify(|v| {
                    if fresh {
                        v.all = page.records.clone();
                    } else {
                        v.all.extend(page.records.iter().cloned());
                    }
                    v.page = page.records;
                    v.has_next = page.has_next;
                    v.fetching = false;
                });
            }
            Err(e) => {
                Logger::error(
                    "LIVE_CURSOR_FETCH_FAILED",
                    &[
                        ("build_id", self.params.build_id.as_str()),
                        ("variant", self.params.target.variant()),
                        ("code", e.code()),
                        ("reason", e.to_string().as_str()),
                    ],
                );
                self.view.send_modify(|v| v.fetching = false);
            }
        }
    }

    /// Finish the held cursor. Idempotent.
    pub fn finish(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.finish();
        }
    }

    async fn acquire(&mut self, restore: bool) {
        self.finish();

        if restore || self.db.is_none() {
            self.view.send_modify(|v| v.fetching = true);
            match restore_db(self.store.clone(), &self.params.build_id).await {
                Ok(db) => self.db = Some(db),
                Err(e) => {
                    self.db = None;
                    Logger::error(
                        "LIVE_CURSOR_RESTORE_FAILED",
                        &[
                            ("build_id", self.params.build_id.as_str()),
                            ("code", e.code()),
                            ("reason", e.to_string().as_str()),
                        ],
                    );
                    self.view.send_modify(|v| v.fetching = false);
                    return;
                }
            }
        }

        let Some(db) = &self.db else {
            return;
        };

        let opened = match &self.params.target {
            CursorTarget::Filter { query, sort } => {
                db.cursor(query.clone(), sort.clone(), self.params.skip, self.params.limit)
            }
            CursorTarget::Text(text) => db.cursor_text(text, self.params.skip, self.params.limit),
        };

        match opened {
            Ok(cursor) => {
                self.cursor = Some(cursor);
                self.fresh = true;
                self.next().await;
            }
            Err(e) => {
                Logger::error(
                    "LIVE_CURSOR_OPEN_FAILED",
                    &[
                        ("build_id", self.params.build_id.as_str()),
                        ("variant", self.params.target.variant()),
                        ("code", e.code()),
                        ("reason", e.to_string().as_str()),
                    ],
                );
                self.view.send_modify(|v| v.fetching = false);
            }
        }
    }
}

impl Drop for LiveCursor {
    fn drop(&mut self) {
        self.finish();
    }
}
