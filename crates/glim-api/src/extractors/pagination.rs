//! Pagination query parameter extractor.

use serde::{Deserialize, Serialize};

use glim_core::types::pagination::PageRequest;

/// Query parameters for list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-based, default: 1).
    pub page: Option<u64>,
    /// Items per page (default: 100).
    pub limit: Option<u64>,
}

impl PaginationParams {
    /// Converts to a `PageRequest`.
    pub fn into_page_request(self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(0), self.limit.unwrap_or(0))
    }
}
