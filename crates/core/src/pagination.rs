//! Page-number pagination for post listings.
//!
//! Page numbers are 1-based. A missing or malformed page number falls back
//! to the first page; a number outside `1..=num_pages` falls back to the
//! last page. An empty listing still has one (empty) page.

use serde::Serialize;

/// Number of posts shown per listing page.
pub const PAGE_SIZE: u64 = 10;

/// Number of pages needed for `total` items.
#[must_use]
pub const fn num_pages(total: u64, per_page: u64) -> u64 {
    if total == 0 || per_page == 0 {
        1
    } else {
        total.div_ceil(per_page)
    }
}

/// Resolve a raw `?page=` value against the size of a listing.
#[must_use]
pub fn resolve_page(raw: Option<&str>, total: u64, per_page: u64) -> u64 {
    let last = num_pages(total, per_page);

    match raw.and_then(parse_page_number) {
        None => 1,
        Some(n) if n < 1 => last,
        Some(n) => u64::try_from(n).map_or(last, |n| n.min(last)),
    }
}

fn parse_page_number(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub number: u64,
    /// Total number of pages (at least 1).
    pub num_pages: u64,
    /// Total number of items across all pages.
    pub total: u64,
    /// Page size.
    pub per_page: u64,
}

impl<T> Page<T> {
    /// Build a page from already-sliced items.
    #[must_use]
    pub const fn new(items: Vec<T>, number: u64, total: u64, per_page: u64) -> Self {
        Self {
            items,
            number,
            num_pages: num_pages(total, per_page),
            total,
            per_page,
        }
    }

    /// Row offset of the first item on page `number`.
    #[must_use]
    pub const fn offset(number: u64, per_page: u64) -> u64 {
        number.saturating_sub(1) * per_page
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Number of the next page, if any.
    #[must_use]
    pub const fn next_page_number(&self) -> Option<u64> {
        if self.has_next() {
            Some(self.number + 1)
        } else {
            None
        }
    }

    /// Number of the previous page, if any.
    #[must_use]
    pub const fn previous_page_number(&self) -> Option<u64> {
        if self.has_previous() {
            Some(self.number - 1)
        } else {
            None
        }
    }

    /// Transform the items, keeping the page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_pages() {
        assert_eq!(num_pages(0, 10), 1);
        assert_eq!(num_pages(10, 10), 1);
        assert_eq!(num_pages(13, 10), 2);
        assert_eq!(num_pages(21, 10), 3);
    }

    #[test]
    fn test_resolve_missing_or_invalid_is_first_page() {
        assert_eq!(resolve_page(None, 13, 10), 1);
        assert_eq!(resolve_page(Some("abc"), 13, 10), 1);
        assert_eq!(resolve_page(Some(""), 13, 10), 1);
    }

    #[test]
    fn test_resolve_out_of_range_is_last_page() {
        assert_eq!(resolve_page(Some("99"), 13, 10), 2);
        assert_eq!(resolve_page(Some("0"), 13, 10), 2);
        assert_eq!(resolve_page(Some("-3"), 13, 10), 2);
        assert_eq!(resolve_page(Some("5"), 0, 10), 1);
    }

    #[test]
    fn test_resolve_in_range() {
        assert_eq!(resolve_page(Some("2"), 13, 10), 2);
        assert_eq!(resolve_page(Some(" 1 "), 13, 10), 1);
        assert_eq!(resolve_page(Some("2.0"), 13, 10), 1);
    }

    #[test]
    fn test_page_navigation() {
        let first = Page::new(vec![0; 10], 1, 13, 10);
        assert!(first.has_next());
        assert!(!first.has_previous());
        assert_eq!(first.next_page_number(), Some(2));
        assert_eq!(first.previous_page_number(), None);

        let second = Page::new(vec![0; 3], 2, 13, 10);
        assert!(!second.has_next());
        assert!(second.has_previous());
        assert_eq!(second.previous_page_number(), Some(1));
        assert_eq!(Page::<u8>::offset(2, 10), 10);
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let page = Page::<u8>::new(Vec::new(), 1, 0, PAGE_SIZE);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2, 3], 2, 13, 10).map(|n| n * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!(page.number, 2);
        assert_eq!(page.num_pages, 2);
    }
}
