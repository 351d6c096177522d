//! Pagination envelopes for list endpoints.

use serde::{Deserialize, Serialize};

use super::row::Row;

/// One page of entities as returned by a repository.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The entities on this page.
    pub items: Vec<T>,
    /// Total number of matching entities across all pages.
    pub total: u64,
    /// Page number (1-based).
    pub page: u32,
    /// Page size used for the query.
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Create a new page.
    pub fn new(items: Vec<T>, total: u64, page: u32, per_page: u32) -> Self {
        Self {
            items,
            total,
            page,
            per_page,
        }
    }

    /// Pagination metadata for this page.
    pub fn meta(&self) -> PageMeta {
        PageMeta::new(self.page, self.per_page, self.total)
    }
}

/// Pagination metadata sent next to list rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Current page number (1-based).
    pub current_page: u32,
    /// Rows per page.
    pub per_page: u32,
    /// Total rows across all pages.
    pub total: u64,
    /// Last page number; at least 1 even when empty.
    pub last_page: u32,
}

impl PageMeta {
    /// Compute metadata from page position and total.
    pub fn new(current_page: u32, per_page: u32, total: u64) -> Self {
        let per_page = per_page.max(1);
        let pages = total.div_ceil(u64::from(per_page)).max(1);
        Self {
            current_page,
            per_page,
            total,
            last_page: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }
}

/// The `{rows, meta}` envelope returned by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Transformed rows for the current page.
    pub rows: Vec<Row>,
    /// Pagination metadata.
    pub meta: PageMeta,
}
