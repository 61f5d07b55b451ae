//! Query windows and pagination.
//!
//! Lists are either page-based (`page`/`limit`, answered with [`Pagination`])
//! or step-based (`offset`/`limit`, answered with a bare total). Both reduce to
//! a [`Window`] before they reach the store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 20;

/// Largest accepted page size.
pub const MAX_LIMIT: u64 = 500;

/// Exact-match payload filters, applied as JSON containment.
pub type Filters = Map<String, Value>;

/// Row offset and count handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Rows to skip.
    pub offset: u64,

    /// Rows to return.
    pub limit: u64,
}

/// Page-based request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u64,
    limit: u64,
}

impl Page {
    /// Build a page request, applying defaults and clamping the limit.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: clamp_limit(limit),
        }
    }

    /// One-based page number.
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Page size.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Rows covered by this page.
    pub fn window(&self) -> Window {
        Window {
            offset: (self.page - 1).saturating_mul(self.limit),
            limit: self.limit,
        }
    }

    /// Pagination metadata for a result with `total` matching rows.
    pub fn paginate(&self, total: u64) -> Pagination {
        let total_page = total.div_ceil(self.limit);

        Pagination {
            total,
            page: self.page,
            per_page: self.limit,
            prev: if self.page > 1 { self.page - 1 } else { 0 },
            next: if self.page < total_page {
                self.page + 1
            } else {
                0
            },
            total_page,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Offset-based request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    offset: u64,
    limit: u64,
}

impl Step {
    /// Build a step request, applying defaults and clamping the limit.
    pub fn new(offset: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: clamp_limit(limit),
        }
    }

    /// Rows covered by this step.
    pub fn window(&self) -> Window {
        Window {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Either paging style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Page-based.
    Page(Page),

    /// Offset-based.
    Step(Step),
}

impl Paging {
    /// Rows covered by the request.
    pub fn window(&self) -> Window {
        match self {
            Self::Page(page) => page.window(),
            Self::Step(step) => step.window(),
        }
    }

    /// Paging metadata for a result with `total` matching rows.
    pub fn describe(&self, total: u64) -> PageInfo {
        match self {
            Self::Page(page) => PageInfo::Page(page.paginate(total)),
            Self::Step(_) => PageInfo::Step { total },
        }
    }
}

/// Page metadata returned with page-based lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Matching rows.
    pub total: u64,

    /// Current page.
    pub page: u64,

    /// Page size.
    pub per_page: u64,

    /// Previous page, `0` on the first page.
    pub prev: u64,

    /// Next page, `0` on the last page.
    pub next: u64,

    /// Number of pages.
    pub total_page: u64,
}

/// Paging metadata for either style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageInfo {
    /// Page-based metadata.
    Page(Pagination),

    /// Offset-based total.
    Step {
        /// Matching rows.
        total: u64,
    },
}

impl PageInfo {
    /// Matching rows.
    pub fn total(&self) -> u64 {
        match self {
            Self::Page(pagination) => pagination.total,
            Self::Step { total } => *total,
        }
    }
}

/// Free-text and exact-match search over live records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    /// Case-insensitive substring matched against the natural key and search fields.
    pub q: Option<String>,

    /// Exact-match payload filters.
    pub filters: Filters,
}

impl SearchQuery {
    /// The `ILIKE` pattern for `q`, or `None` when no text search is requested.
    pub fn pattern(&self) -> Option<String> {
        let q = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())?;

        let escaped = q
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");

        Some(format!("%{escaped}%"))
    }
}

/// One window of a list together with its paging metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    /// Rows in the window.
    pub items: Vec<T>,

    /// Paging metadata for the whole result.
    pub page_info: PageInfo,
}

fn clamp_limit(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        let page = Page::new(Some(0), Some(10_000));

        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), MAX_LIMIT);
        assert_eq!(Page::default().limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn page_window_offsets_by_previous_pages() {
        let window = Page::new(Some(3), Some(25)).window();

        assert_eq!(window, Window { offset: 50, limit: 25 });
    }

    #[test]
    fn paginate_reports_neighbours() {
        let pagination = Page::new(Some(2), Some(10)).paginate(35);

        assert_eq!(
            pagination,
            Pagination {
                total: 35,
                page: 2,
                per_page: 10,
                prev: 1,
                next: 3,
                total_page: 4,
            }
        );
    }

    #[test]
    fn paginate_last_page_has_no_next() {
        let pagination = Page::new(Some(4), Some(10)).paginate(35);

        assert_eq!(pagination.next, 0);
        assert_eq!(pagination.prev, 3);
    }

    #[test]
    fn step_window_uses_offset() {
        let paging = Paging::Step(Step::new(Some(7), Some(3)));

        assert_eq!(paging.window(), Window { offset: 7, limit: 3 });
        assert_eq!(paging.describe(12), PageInfo::Step { total: 12 });
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let query = SearchQuery {
            q: Some(" 50%_off ".to_string()),
            filters: Filters::new(),
        };

        assert_eq!(query.pattern().as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(SearchQuery::default().pattern(), None);
    }
}
