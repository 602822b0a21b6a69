//! Page-number pagination shared by every feed.
//!
//! Page numbers are 1-based and resolved leniently: a missing or non-numeric
//! number falls back to the first page and any number outside the range
//! (zero, negative or past the end) falls back to the last one, so a feed URL never fails because of its `page` query.

use std::num::IntErrorKind;

use sea_orm::{ConnectionTrait, DbErr, ItemsAndPagesNumber, PaginatorTrait, SelectorTrait};
use serde::Serialize;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page, at most `page_size` of them.
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub number: u64,
    /// Total number of pages; an empty listing still has one page.
    pub num_pages: u64,
    /// Total number of items across all pages.
    pub total: u64,
    /// Configured page size.
    pub page_size: u64,
}

impl<T> Page<T> {
    /// The single, empty page of an empty listing.
    #[must_use]
    pub const fn empty(page_size: u64) -> Self {
        Self {
            items: Vec::new(),
            number: 1,
            num_pages: 1,
            total: 0,
            page_size,
        }
    }

    /// Whether a page precedes this one.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Whether a page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// Number of the preceding page, if any.
    #[must_use]
    pub const fn previous_page_number(&self) -> Option<u64> {
        if self.has_previous() {
            Some(self.number - 1)
        } else {
            None
        }
    }

    /// Number of the following page, if any.
    #[must_use]
    pub const fn next_page_number(&self) -> Option<u64> {
        if self.has_next() {
            Some(self.number + 1)
        } else {
            None
        }
    }

    /// Whether this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the items, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            page_size: self.page_size,
        }
    }
}

/// Number of pages needed for `total` items; never less than one.
#[must_use]
pub const fn page_count(total: u64, page_size: u64) -> u64 {
    let page_size = if page_size == 0 { 1 } else { page_size };
    let pages = total.div_ceil(page_size);
    if pages == 0 { 1 } else { pages }
}

/// Resolve a requested page number against the number of pages.
///
/// Missing or non-integer input yields page 1. Any integer outside
/// `1..=num_pages`, negative or too large to represent included, yields the
/// last page.
#[must_use]
pub fn resolve_page(requested: Option<&str>, num_pages: u64) -> u64 {
    let num_pages = num_pages.max(1);
    match requested.map(str::trim).map(str::parse::<i64>) {
        None => 1,
        Some(Err(e)) => match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => num_pages,
            _ => 1,
        },
        Some(Ok(n)) => match u64::try_from(n) {
            Ok(n) if (1..=num_pages).contains(&n) => n,
            _ => num_pages,
        },
    }
}

/// Run a paginated query and return the requested page.
///
/// Issues a count query first, then fetches the resolved page unless the
/// listing is empty.
pub async fn fetch_page<'db, C, S>(
    db: &'db C,
    query: S,
    page_size: u64,
    requested: Option<&str>,
) -> Result<Page<<S::Selector as SelectorTrait>::Item>, DbErr>
where
    C: ConnectionTrait,
    S: PaginatorTrait<'db, C>,
{
    let page_size = page_size.max(1);
    let paginator = query.paginate(db, page_size);
    let ItemsAndPagesNumber {
        number_of_items,
        number_of_pages,
    } = paginator.num_items_and_pages().await?;

    if number_of_items == 0 {
        return Ok(Page::empty(page_size));
    }

    let num_pages = number_of_pages.max(1);
    let number = resolve_page(requested, num_pages);
    let items = paginator.fetch_page(number - 1).await?;

    Ok(Page {
        items,
        number,
        num_pages,
        total: number_of_items,
        page_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(number: u64, num_pages: u64) -> Page<u64> {
        Page {
            items: vec![1],
            number,
            num_pages,
            total: num_pages * 10,
            page_size: 10,
        }
    }

    #[test]
    fn test_resolve_page_defaults_to_first() {
        assert_eq!(resolve_page(None, 3), 1);
        assert_eq!(resolve_page(Some("abc"), 3), 1);
        assert_eq!(resolve_page(Some(""), 3), 1);
        assert_eq!(resolve_page(Some("1.5"), 3), 1);
    }

    #[test]
    fn test_resolve_page_clamps_to_last() {
        assert_eq!(resolve_page(Some("9"), 3), 3);
        assert_eq!(resolve_page(Some("0"), 3), 3);
        assert_eq!(resolve_page(Some("2"), 3), 2);
        assert_eq!(resolve_page(Some(" 2 "), 3), 2);
    }

    #[test]
    fn test_resolve_page_negative_goes_to_last() {
        assert_eq!(resolve_page(Some("-1"), 3), 3);
        assert_eq!(resolve_page(Some("-2"), 3), 3);
        assert_eq!(resolve_page(Some("99999999999999999999"), 3), 3);
        assert_eq!(resolve_page(Some("-99999999999999999999"), 3), 3);
    }

    #[test]
    fn test_resolve_page_with_no_pages() {
        assert_eq!(resolve_page(Some("5"), 0), 1);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(14, 10), 2);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn test_page_navigation() {
        let first = page_of(1, 2);
        assert!(!first.has_previous());
        assert!(first.has_next());
        assert_eq!(first.next_page_number(), Some(2));
        assert_eq!(first.previous_page_number(), None);

        let last = page_of(2, 2);
        assert!(last.has_previous());
        assert!(!last.has_next());
        assert_eq!(last.previous_page_number(), Some(1));
    }

    #[test]
    fn test_empty_page() {
        let page = Page::<u64>::empty(10);
        assert!(page.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = page_of(2, 3).map(|n| n.to_string());
        assert_eq!(page.items, vec!["1".to_string()]);
        assert_eq!(page.number, 2);
        assert_eq!(page.num_pages, 3);
    }
}
