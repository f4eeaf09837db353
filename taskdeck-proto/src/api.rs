//! List pagination and error document types shared with the remote task
//! service.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Page number used when the caller does not pick one.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the caller does not pick one.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Which slice of the filtered result set a list request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Number of items per page.
    pub per_page: u32,
}

impl PageRequest {
    /// Builds a page request. Both values are clamped to at least 1.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Zero-based index of the first item on this page.
    #[must_use]
    pub const fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.per_page as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PER_PAGE)
    }
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page, in server order.
    pub items: Vec<T>,
    /// Number of items across all pages.
    pub total: u64,
    /// 1-based page number of this response.
    pub page: u32,
    /// Page size used by the server.
    pub per_page: u32,
    /// Number of pages in the full result set.
    pub pages: u32,
}

impl<T> Paginated<T> {
    /// Returns the position metadata of this page.
    #[must_use]
    pub const fn pagination(&self) -> Pagination {
        Pagination {
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            pages: self.pages,
        }
    }

    /// Splits the response into its items and position metadata.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Pagination) {
        let pagination = self.pagination();
        (self.items, pagination)
    }
}

/// Position of one list response within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of items across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Number of pages.
    pub pages: u32,
}

impl Pagination {
    /// Computes the page count for `total` items at `per_page` items each.
    #[must_use]
    pub fn page_count(total: u64, per_page: u32) -> u32 {
        if per_page == 0 {
            return 0;
        }
        u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
    }

    /// Returns `true` if a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }

    /// Returns `true` if an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// The request that would fetch this same page again.
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

/// The `detail` member of an error response: either a single message or
/// per-field messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// A single human-readable message.
    Message(String),
    /// Messages keyed by the offending field.
    Fields(BTreeMap<String, String>),
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => f.write_str(message),
            Self::Fields(_) => f.write_str("An error occurred"),
        }
    }
}

/// Error document returned by the remote service on non-success statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// What went wrong.
    pub detail: ErrorDetail,
}
