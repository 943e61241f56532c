//! Client-side pagination of the attendee list.
//!
//! The summary endpoint returns every attendee at once; pages are slices over
//! that list. Pages are 1-based and always clamped into `[1, total_pages]`
//! (page 1 when the list is empty).

use crate::config::DEFAULT_PAGE_SIZE;

/// Current page and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
}

impl Pagination {
    /// Start on page 1. A zero page size is treated as one.
    #[must_use]
    pub const fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: if page_size == 0 { 1 } else { page_size },
        }
    }

    /// Current 1-based page.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(len / page_size)`.
    #[must_use]
    pub const fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// Go to `page`, clamped to the pages `len` items fill.
    pub fn go_to(&mut self, page: usize, len: usize) {
        self.page = page.clamp(1, self.total_pages(len).max(1));
    }

    /// Advance one page; stays on the last page.
    pub fn next(&mut self, len: usize) {
        self.go_to(self.page.saturating_add(1), len);
    }

    /// Go back one page; stays on page 1.
    pub fn previous(&mut self, len: usize) {
        self.go_to(self.page.saturating_sub(1), len);
    }

    /// Back to page 1.
    pub const fn reset(&mut self) {
        self.page = 1;
    }

    /// Items on the current page.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.page_size).min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_twelve_items_page_size_five() {
        let items: Vec<usize> = (0..12).collect();
        let mut pagination = Pagination::new(5);

        assert_eq!(pagination.total_pages(items.len()), 3);
        assert_eq!(pagination.slice(&items), &[0, 1, 2, 3, 4]);

        pagination.go_to(3, items.len());
        assert_eq!(pagination.slice(&items), &[10, 11]);
    }

    #[test]
    fn test_clamping() {
        let mut pagination = Pagination::new(5);

        pagination.go_to(99, 12);
        assert_eq!(pagination.page(), 3);
        pagination.next(12);
        assert_eq!(pagination.page(), 3);

        pagination.go_to(0, 12);
        assert_eq!(pagination.page(), 1);
        pagination.previous(12);
        assert_eq!(pagination.page(), 1);
    }

    #[test]
    fn test_empty_list_stays_on_page_one() {
        let mut pagination = Pagination::new(5);
        pagination.next(0);

        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.total_pages(0), 0);
        assert!(pagination.slice::<u8>(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_pages_cover_every_item_once(len in 0usize..200, size in 1usize..20) {
            let items: Vec<usize> = (0..len).collect();
            let mut pagination = Pagination::new(size);
            let mut seen = Vec::new();

            for page in 1..=pagination.total_pages(len) {
                pagination.go_to(page, len);
                let slice = pagination.slice(&items);
                prop_assert!(!slice.is_empty());
                prop_assert!(slice.len() <= size);
                seen.extend_from_slice(slice);
            }

            prop_assert_eq!(seen, items);
        }

        #[test]
        fn prop_page_always_in_bounds(len in 0usize..200, size in 1usize..20, target in 0usize..100) {
            let mut pagination = Pagination::new(size);
            pagination.go_to(target, len);

            prop_assert!(pagination.page() >= 1);
            prop_assert!(pagination.page() <= pagination.total_pages(len).max(1));
        }
    }
}
