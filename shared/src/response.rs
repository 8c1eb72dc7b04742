//! Paginated list response

use serde::{Deserialize, Serialize};

use crate::request::PaginationQuery;

/// Pagination metadata
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-based)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
    /// Total number of items
    pub total: u64,
    /// Total number of pages
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page as u64) as u32
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            items,
            pagination: Pagination::new(page, per_page, total),
        }
    }

    /// Build from the query that produced `items`
    pub fn from_query(items: Vec<T>, query: &PaginationQuery, total: i64) -> Self {
        Self::new(items, query.page(), query.limit(), total.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 20, 20).total_pages, 1);
        assert_eq!(Pagination::new(2, 20, 41).total_pages, 3);
        assert_eq!(Pagination::new(1, 0, 10).total_pages, 0);
    }

    #[test]
    fn test_from_query() {
        let query = PaginationQuery {
            page: 2,
            per_page: 10,
        };
        let resp = PaginatedResponse::from_query(vec![1, 2, 3], &query, 13);
        assert_eq!(resp.pagination.page, 2);
        assert_eq!(resp.pagination.per_page, 10);
        assert_eq!(resp.pagination.total_pages, 2);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["items"].as_array().unwrap().len(), 3);
        assert_eq!(json["pagination"]["total"], 13);
    }
}
