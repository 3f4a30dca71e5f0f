//! Cursor-paged result type returned by list endpoints.

use serde::{Deserialize, Serialize};

use crate::types::cursor::CursorToken;

/// One page of a cursor-paginated scan.
///
/// Pages are addressed by cursor tokens rather than offsets, so a page
/// stays stable while other documents are inserted concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    /// The items on this page, in the scan's canonical order.
    pub results: Vec<T>,
    /// Token resuming the scan just before the first item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<CursorToken>,
    /// Token resuming the scan just after the last item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<CursorToken>,
    /// Whether items exist before this page.
    pub has_previous: bool,
    /// Whether items exist after this page.
    pub has_next: bool,
}

impl<T> PagedResult<T> {
    /// Create an empty page with no neighbours.
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            previous: None,
            next: None,
            has_previous: false,
            has_next: false,
        }
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Transform every item while keeping the cursors.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            results: self.results.into_iter().map(f).collect(),
            previous: self.previous,
            next: self.next,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}
