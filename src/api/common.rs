//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API endpoints.

use serde::{Deserialize, Serialize};

use crate::models::ListParams;

// ============================================================================
// Pagination Defaults
// ============================================================================

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size for public listings
pub fn default_per_page() -> u32 {
    12
}

/// Default page size for admin listings
pub fn default_admin_per_page() -> u32 {
    20
}

// ============================================================================
// Pagination Query Types
// ============================================================================

/// Basic pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl PaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

/// Admin pagination query parameters
#[derive(Debug, Deserialize)]
pub struct AdminPaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_admin_per_page")]
    pub per_page: u32,
}

impl AdminPaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

/// Generic list wrapper for non-paginated collections
#[derive(Debug, Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ItemsResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// Body for toggling a boolean flag
#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    #[serde(default = "default_true")]
    pub value: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn test_pagination_query_clamps() {
        let uri: Uri = "/poems?page=0&per_page=500".parse().unwrap();
        let Query(q) = Query::<PaginationQuery>::try_from_uri(&uri).unwrap();
        let params = q.params();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);

        let uri: Uri = "/admin/poems".parse().unwrap();
        let Query(q) = Query::<AdminPaginationQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(q.params().per_page, 20);
    }
}
