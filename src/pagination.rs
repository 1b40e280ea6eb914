//! Page metadata returned alongside list results.

use serde::Serialize;

/// Number of leads per page when the caller does not ask for a limit.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// How many page links to show around the edges and the current page.
#[derive(Debug, Clone, Copy)]
struct PageWindow {
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
}

const DEFAULT_WINDOW: PageWindow = PageWindow {
    left_edge: 2,
    left_current: 2,
    right_current: 4,
    right_edge: 2,
};

/// Builds the compact navigation list: page numbers with `None` marking gaps.
fn get_pages(total_pages: usize, current_page: usize, window: PageWindow) -> Vec<Option<usize>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = (1 + window.left_edge).min(last_page + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(window.left_current));
    let mid_end = (current_page + window.right_current + 1).min(last_page + 1);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(window.right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

/// One page of results plus what a client needs to navigate the rest.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Number of items matching the filters across all pages.
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub pages: Vec<Option<usize>>,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, current_page: usize, limit: usize, total: usize) -> Self {
        let current_page = current_page.max(1);
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };

        let pages = get_pages(total_pages, current_page, DEFAULT_WINDOW);

        Self {
            items,
            total,
            page: current_page,
            limit,
            total_pages,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pages_for_empty_result() {
        assert!(get_pages(0, 1, DEFAULT_WINDOW).is_empty());
        let page: Paginated<u8> = Paginated::new(vec![], 1, 10, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.pages.is_empty());
    }

    #[test]
    fn short_ranges_have_no_gaps() {
        assert_eq!(
            get_pages(3, 2, DEFAULT_WINDOW),
            vec![Some(1), Some(2), Some(3)]
        );
    }

    #[test]
    fn long_ranges_collapse_into_gaps() {
        assert_eq!(
            get_pages(20, 10, DEFAULT_WINDOW),
            vec![
                Some(1),
                Some(2),
                None,
                Some(8),
                Some(9),
                Some(10),
                Some(11),
                Some(12),
                Some(13),
                Some(14),
                None,
                Some(19),
                Some(20),
            ]
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Paginated::new(vec![1, 2], 2, 2, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
        assert_eq!(page.total, 5);
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        let page = Paginated::new(vec![1], 0, 10, 1);
        assert_eq!(page.page, 1);
    }
}
