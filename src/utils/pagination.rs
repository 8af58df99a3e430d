use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Offset pagination requested by a client, already clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32, total: i64) -> Self {
        let total = total.max(0);
        let size = i64::from(page_size.max(1));
        let total_pages = (total + size - 1) / size;
        let next_page = (i64::from(page) * size < total).then(|| page + 1);
        let prev_page = (page > 1).then(|| page - 1);

        Self {
            page,
            page_size,
            total,
            total_pages,
            next_page,
            prev_page,
        }
    }

    pub fn for_request(request: PageRequest, total: i64) -> Self {
        Self::new(request.page, request.page_size, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_links_both_ways() {
        let p = Pagination::new(2, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.next_page, Some(3));
        assert_eq!(p.prev_page, Some(1));
    }

    #[test]
    fn last_page_has_no_next() {
        let p = Pagination::new(3, 10, 25);
        assert_eq!(p.next_page, None);
        assert_eq!(p.prev_page, Some(2));

        let exact = Pagination::new(2, 10, 20);
        assert_eq!(exact.total_pages, 2);
        assert_eq!(exact.next_page, None);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.next_page, None);
        assert_eq!(p.prev_page, None);
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        for (total, size, expected) in [(1, 50, 1), (50, 50, 1), (51, 50, 2), (99, 10, 10)] {
            assert_eq!(Pagination::new(1, size, total).total_pages, expected);
        }
    }

    #[test]
    fn page_request_clamps_input() {
        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, MAX_PAGE_SIZE);

        let req = PageRequest::new(Some(3), Some(10));
        assert_eq!(req.offset(), 20);
        assert_eq!(req.limit(), 10);

        assert_eq!(PageRequest::default().page_size, DEFAULT_PAGE_SIZE);
    }
}
