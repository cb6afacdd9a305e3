//! Common API DTOs
//!
//! Response shapes follow the wire contract the mobile client already speaks:
//! plain `{"message": ...}` bodies for writes, `{"data": [...]}` for
//! unpaginated lists and `{"paging": ..., "data": [...]}` for paginated ones.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `{"message": "..."}` body returned by write operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"data": [...]}` wrapper for unpaginated list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

/// Pagination metadata for list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Paging {
    /// Current page (1-based)
    pub page: u64,
    /// Page size
    pub limit: u64,
    /// Total number of matching rows (across all pages)
    pub total: u64,
    /// Total number of pages
    pub total_pages: u64,
}

/// `{"paging": ..., "data": [...]}` body for paginated lists
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PagedResponse<T> {
    pub paging: Paging,
    pub data: Vec<T>,
}

impl<T> PagedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = ((total as f64) / (limit as f64)).ceil() as u64;
        Self {
            paging: Paging {
                page,
                limit,
                total,
                total_pages,
            },
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let response = PagedResponse::<u8>::new(vec![], 41, 1, 20);
        assert_eq!(response.paging.total_pages, 3);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let response = PagedResponse::<u8>::new(vec![], 0, 1, 20);
        assert_eq!(response.paging.total_pages, 0);
    }
}
