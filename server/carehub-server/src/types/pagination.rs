//! Pagination types shared by every list endpoint

use serde::Deserialize;

use crate::error::{api_success_with_meta, ApiResponse, PaginationInfo, ResponseMetadata};

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// `page` / `limit` query parameters
///
/// List queries embed these two fields directly rather than through
/// `#[serde(flatten)]`, which does not parse numbers from query strings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PaginationParams {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self { page, limit }
    }

    /// Page number, 1-based
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to `1..=MAX_LIMIT`
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn total_pages(&self, total_count: u64) -> u32 {
        let pages = total_count.div_ceil(u64::from(self.limit()));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn to_metadata(&self, total_count: u64) -> ResponseMetadata {
        let total_pages = self.total_pages(total_count);
        ResponseMetadata {
            pagination: Some(PaginationInfo {
                page: self.page(),
                limit: self.limit(),
                total_pages,
                has_next: self.page() < total_pages,
                has_previous: self.page() > 1,
            }),
            total_count: Some(total_count),
        }
    }

    pub fn wrap_response<T>(&self, data: T, total_count: u64) -> ApiResponse<T> {
        api_success_with_meta(data, self.to_metadata(total_count))
    }
}
