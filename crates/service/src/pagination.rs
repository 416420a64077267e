//! Pagination utilities for service layer
//!
//! Provides `PageRequest` and helpers to normalize inputs.

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page index
    pub page: usize,
    /// items per page
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }.normalize()
    }

    /// Clamp to sane defaults
    pub fn normalize(self) -> Self {
        let page = if self.page == 0 { 1 } else { self.page };
        let page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    /// Changing the page size starts over from the first page.
    pub fn with_page_size(self, page_size: usize) -> Self {
        Self::new(1, page_size)
    }

    pub fn with_page(self, page: usize) -> Self {
        Self::new(page, self.page_size)
    }

    /// `ceil(count / page_size)`, never less than 1.
    pub fn total_pages(&self, count: usize) -> usize {
        count.div_ceil(self.page_size.max(1)).max(1)
    }

    /// Requested page pulled back into `1..=total_pages`.
    pub fn effective_page(&self, count: usize) -> usize {
        self.page.clamp(1, self.total_pages(count))
    }
}

impl Default for PageRequest {
    fn default() -> Self { Self { page: 1, page_size: DEFAULT_PAGE_SIZE } }
}
