//! Fixed-size pages over the filtered list.
//!
//! Pages are 1-based. Requests outside `[1, total_pages]` are clamped
//! instead of rejected.

use serde::{Deserialize, Serialize};

/// One entry of the page-number strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "page", rename_all = "lowercase")]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// Number of pages needed for `len` items. An empty list still has one page.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// Page-number strip: first, `...` when `current > 3`, `current - 1` when
/// `current > 2`, current, `current + 1` when `current < total - 1`, `...`
/// when `current < total - 2`, last. A single page has no controls.
pub fn page_links(current: usize, total: usize) -> Vec<PageLink> {
    if total <= 1 {
        return Vec::new();
    }
    let current = current.clamp(1, total);
    let mut links = vec![PageLink::Page(1)];

    if current > 3 {
        links.push(PageLink::Ellipsis);
    }
    if current > 2 {
        links.push(PageLink::Page(current - 1));
    }
    if current != 1 && current != total {
        links.push(PageLink::Page(current));
    }
    if current + 1 < total {
        links.push(PageLink::Page(current + 1));
    }
    if current + 2 < total {
        links.push(PageLink::Ellipsis);
    }

    links.push(PageLink::Page(total));
    links
}

/// Page cursor over a list of known length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginator {
    page_size: usize,
    current: usize,
}

impl Paginator {
    /// A zero page size is treated as one item per page
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Move to `page`, clamped for a list of `len` items; returns the page
    /// actually selected
    pub fn go_to(&mut self, page: usize, len: usize) -> usize {
        self.current = page.clamp(1, total_pages(len, self.page_size));
        self.current
    }

    /// Re-clamp after the list length changed
    pub fn clamp(&mut self, len: usize) -> usize {
        self.go_to(self.current, len)
    }

    pub fn reset(&mut self) {
        self.current = 1;
    }

    pub fn total_pages(&self, len: usize) -> usize {
        total_pages(len, self.page_size)
    }

    /// Index range of the current page within a list of `len` items
    pub fn range(&self, len: usize) -> std::ops::Range<usize> {
        let page = self.current.clamp(1, self.total_pages(len));
        let start = ((page - 1) * self.page_size).min(len);
        let end = (start + self.page_size).min(len);
        start..end
    }

    /// Items of the current page
    pub fn page_items<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }

    pub fn links(&self, len: usize) -> Vec<PageLink> {
        page_links(self.current, self.total_pages(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageLink::{Ellipsis, Page};

    #[test]
    fn test_pages_cover_list_exactly() {
        for len in [0usize, 1, 19, 20, 21, 25, 40, 57] {
            for size in [1usize, 7, 20] {
                let items: Vec<usize> = (0..len).collect();
                let mut pager = Paginator::new(size);
                let mut seen = Vec::new();
                for page in 1..=pager.total_pages(len) {
                    pager.go_to(page, len);
                    seen.extend_from_slice(pager.page_items(&items));
                }
                assert_eq!(seen, items, "len={} size={}", len, size);
            }
        }
    }

    #[test]
    fn test_out_of_range_pages_clamp() {
        let items: Vec<u32> = (0..25).collect();
        let mut pager = Paginator::new(20);

        assert_eq!(pager.go_to(0, items.len()), 1);
        assert_eq!(pager.go_to(9, items.len()), 2);
        assert_eq!(pager.page_items(&items), &items[20..]);

        // list shrinks under the cursor
        assert_eq!(pager.clamp(5), 1);
        assert_eq!(pager.range(0), 0..0);
    }

    #[test]
    fn test_page_links_match_strip_rules() {
        assert!(page_links(1, 1).is_empty());
        assert!(page_links(1, 0).is_empty());
        assert_eq!(page_links(1, 2), vec![Page(1), Page(2)]);
        assert_eq!(page_links(2, 2), vec![Page(1), Page(2)]);
        assert_eq!(page_links(1, 5), vec![Page(1), Page(2), Ellipsis, Page(5)]);
        assert_eq!(page_links(3, 5), vec![Page(1), Page(2), Page(3), Page(4), Page(5)]);
        assert_eq!(page_links(5, 5), vec![Page(1), Ellipsis, Page(4), Page(5)]);
        assert_eq!(
            page_links(6, 10),
            vec![Page(1), Ellipsis, Page(5), Page(6), Page(7), Ellipsis, Page(10)]
        );
        assert_eq!(page_links(2, 3), vec![Page(1), Page(2), Page(3)]);
    }
}
