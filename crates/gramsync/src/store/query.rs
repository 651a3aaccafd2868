use serde::Serialize;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    /// Page number (0-indexed).
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
}

/// Default page size for post listings.
pub const DEFAULT_PER_PAGE: u64 = 10;

const MIN_PER_PAGE: u64 = 1;

/// Largest accepted page size.
pub const MAX_PER_PAGE: u64 = 1000;

impl Pagination {
    /// Create a new pagination; `per_page` is clamped to `1..=MAX_PER_PAGE`.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page,
            per_page: per_page.clamp(MIN_PER_PAGE, MAX_PER_PAGE),
        }
    }

    /// Row offset of the first item on this page.
    ///
    /// `None` when the offset does not fit a signed 64-bit SQL offset.
    pub fn offset(&self) -> Option<u64> {
        self.page
            .checked_mul(self.per_page)
            .filter(|offset| i64::try_from(*offset).is_ok())
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Result of a paginated query.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResult<T> {
    /// The items for the current page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Current page number (0-indexed).
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl<T> PaginatedResult<T> {
    /// Whether a page after this one exists.
    pub fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages
    }
}
