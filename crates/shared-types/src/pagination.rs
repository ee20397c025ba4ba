//! Pagination value objects for transaction-log queries.

use serde::{Deserialize, Serialize};

/// Default upper bound on page size when the caller does not clamp.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// A 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, starting at 1. Zero is treated as 1.
    pub page: u32,
    /// Requested items per page.
    pub page_size: u32,
}

impl PageRequest {
    /// Create a request for `page` with `page_size` items.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// First page with the given size.
    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    /// Clamp the page size into `1..=max` and normalize page 0 to 1.
    pub fn clamped(self, max: u32) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, max.max(1)),
        }
    }

    /// Offset of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// One page of results plus the total count across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in query order.
    pub items: Vec<T>,
    /// The page number served (1-indexed).
    pub page: u32,
    /// The page size served (after clamping).
    pub page_size: u32,
    /// Total matching items across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Slice `items` according to `request`. `request` must already be clamped.
    pub fn from_slice(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len() as u64;
        let page_items: Vec<T> = items
            .into_iter()
            .skip(request.offset())
            .take(request.page_size as usize)
            .collect();

        Self {
            items: page_items,
            page: request.page.max(1),
            page_size: request.page_size,
            total,
        }
    }

    /// Number of pages needed to serve `total` items.
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size as u64)
    }
}
