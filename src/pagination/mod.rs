//! Keyset (cursor) pagination over collections ordered by integer id.
//!
//! One algorithm serves every list endpoint; the sort direction and limit
//! bounds are per-endpoint configuration. The engine fetches `limit + 1`
//! rows past the caller's cursor and folds the probe row into
//! `has_more`/`next_cursor`.
//!
//! Pages are not snapshot-isolated: concurrent inserts or deletes between two
//! calls can cause an item to be skipped, or (for DESC traversal with inserts
//! at the head) re-seen. That is inherent to keyset pagination without a
//! frozen snapshot and is accepted, not worked around.

use serde::Deserialize;

/// Traversal direction relative to the id ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first; cursor resumes with `id > last_id`.
    Asc,
    /// Newest first; cursor resumes with `id < last_id`.
    Desc,
}

impl SortOrder {
    /// SQL comparison operator for the cursor predicate.
    pub fn cursor_comparison(self) -> &'static str {
        match self {
            SortOrder::Asc => ">",
            SortOrder::Desc => "<",
        }
    }

    /// `ORDER BY` keyword.
    pub fn sql_keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Cursor query parameters shared by every list endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CursorParams {
    pub last_id: Option<i64>,
    pub limit: Option<i64>,
}

/// Per-endpoint limit bounds.
///
/// Out-of-range requests are silently clamped to the default rather than
/// rejected. That hides client mistakes (a `limit=0` or `limit=10000` caller
/// gets the default without being told) and is kept for wire compatibility.
#[derive(Debug, Clone, Copy)]
pub struct LimitPolicy {
    pub default: i64,
    pub max: i64,
}

impl LimitPolicy {
    pub const fn new(default: i64, max: i64) -> Self {
        Self { default, max }
    }

    pub fn clamp(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(n) if n > 0 && n <= self.max => n,
            _ => self.default,
        }
    }

    /// Rows to ask the store for: one extra row probes whether a further
    /// page exists without a second query.
    pub fn fetch_size(&self, requested: Option<i64>) -> i64 {
        self.clamp(requested) + 1
    }
}

/// One bounded, ordered page plus its continuation cursor.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<i64>,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Fold a `limit + 1` fetch into a page.
    ///
    /// If the store returned more than `limit` rows the extra row is
    /// discarded, `has_more` is set, and `next_cursor` is the id of the last
    /// row actually returned. Otherwise the collection is exhausted and the
    /// cursor is null.
    pub fn assemble(mut rows: Vec<T>, limit: i64, id_of: impl Fn(&T) -> i64) -> Self {
        let has_more = rows.len() as i64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }
        let next_cursor = if has_more { rows.last().map(&id_of) } else { None };
        Self { items: rows, next_cursor, has_more }
    }
}
