//! The immutable listing query shared by index, export and repository calls.

use std::collections::BTreeMap;

use serde::Serialize;

use super::filter::FilterValue;
use super::sorting::SortDirection;

/// Search, filter, sort and pagination parameters for a listing.
///
/// Built once per request after validation and passed by reference through
/// services and repositories. The `with_*` methods return modified copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    q: Option<String>,
    page: u32,
    per_page: u32,
    sort: Option<String>,
    direction: SortDirection,
    filters: BTreeMap<String, FilterValue>,
}

impl ListQuery {
    /// Create a query for the given page with no search, sort or filters.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            q: None,
            page: page.max(1),
            per_page: per_page.max(1),
            sort: None,
            direction: SortDirection::default(),
            filters: BTreeMap::new(),
        }
    }

    /// Set the free-text search term. Blank terms clear the search.
    pub fn with_search(mut self, q: Option<String>) -> Self {
        self.q = q
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    /// Set the sort column and direction.
    pub fn with_sort(mut self, field: Option<String>, direction: SortDirection) -> Self {
        self.sort = field;
        self.direction = direction;
        self
    }

    /// Add or replace a filter.
    pub fn with_filter(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.filters.insert(key.into(), value);
        self
    }

    /// Same query positioned on another page.
    pub fn with_page(&self, page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            ..self.clone()
        }
    }

    /// Free-text search term.
    pub fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }

    /// Page number (1-based).
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Rows per page.
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Sort column, already checked against the resource allow-list.
    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    /// Sort direction.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Active filters.
    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    /// Look up a filter value.
    pub fn filter(&self, key: &str) -> Option<&FilterValue> {
        self.filters.get(key)
    }

    /// SQL `OFFSET` for this page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// SQL `LIMIT` for this page.
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}
