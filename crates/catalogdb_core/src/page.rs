//! Paged query results.

use serde::Serialize;

/// One page of a query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Items across all pages.
    pub total_count: usize,
    /// 1-based page number.
    pub page: usize,
    /// Maximum items per page.
    pub page_size: usize,
    /// Number of pages; zero when there are no items.
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Cuts page `page` out of `all`.
    ///
    /// Page numbers and sizes below 1 are raised to 1. A page past the end
    /// is empty but still reports the totals.
    pub fn paginate(all: Vec<T>, page: usize, page_size: usize) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total_count = all.len();
        let total_pages = total_count.div_ceil(page_size);
        let items = all
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        Self {
            items,
            total_count,
            page,
            page_size,
            total_pages,
        }
    }

    /// Returns true if a later page has items.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Returns true if this is not the first page.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
