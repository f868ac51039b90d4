//! Pagination guards for windowed scans
//!
//! A `PageWindow` is a half-open index range over the full store order.

use std::ops::Range;

use crate::errors::ServiceError;

/// Hard cap on the number of positions a single window may cover.
pub const MAX_PAGE_SPAN: u64 = 2;

/// Requested `[start, end)` window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u64,
    pub end: u64,
}

impl PageWindow {
    pub fn new(start: u64, end: u64) -> Self { Self { start, end } }

    /// Check bounds, then ordering, then span, against a store of `len` entries.
    pub fn validate(self, len: usize) -> Result<Range<usize>, ServiceError> {
        let len_u64 = len as u64;
        if self.start > len_u64 || self.end > len_u64 {
            return Err(ServiceError::IndexOutOfBounds { start: self.start, end: self.end, len: len_u64 });
        }
        if self.start > self.end {
            return Err(ServiceError::InvalidRange { start: self.start, end: self.end });
        }
        let span = self.end - self.start;
        if span > MAX_PAGE_SPAN {
            return Err(ServiceError::PageTooLarge { requested: span, max: MAX_PAGE_SPAN });
        }
        // both bounds are <= len, so they fit in usize
        Ok(self.start as usize..self.end as usize)
    }
}
