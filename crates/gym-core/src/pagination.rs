//! # Pagination
//!
//! Page requests are one-based. Page metadata is derived from the total
//! row count: `totalPages = ceil(totalCount / pageSize)`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Page size used when the caller omits `pageSize`.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest accepted `pageSize`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validate raw query values, applying defaults for missing ones.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Result<Self, ValidationError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        let mut errors = ValidationError::new();
        if page < 1 {
            errors.push("page", "page must be at least 1", "too_small");
        }
        if page_size < 1 {
            errors.push("pageSize", "pageSize must be at least 1", "too_small");
        } else if page_size > MAX_PAGE_SIZE {
            errors.push(
                "pageSize",
                format!("pageSize must be at most {MAX_PAGE_SIZE}"),
                "too_big",
            );
        }
        errors.into_result()?;

        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(request: PageRequest, total_count: u64) -> Self {
        let size = u64::from(request.page_size);
        let total_pages = total_count.div_ceil(size);
        Self {
            page: request.page,
            page_size: request.page_size,
            total_count,
            total_pages,
            has_next: u64::from(request.page) < total_pages,
            has_prev: request.page > 1,
        }
    }
}

/// Sort direction. Listings default to newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Apply the direction to an ascending comparison.
    pub fn apply(&self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults() {
        let req = PageRequest::new(None, None).unwrap();
        assert_eq!(req, PageRequest::default());
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), 20);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn bounds_are_enforced() {
        assert!(PageRequest::new(Some(0), None).is_err());
        assert!(PageRequest::new(None, Some(0)).is_err());
        assert!(PageRequest::new(None, Some(101)).is_err());
        assert!(PageRequest::new(Some(3), Some(100)).is_ok());

        let err = PageRequest::new(Some(0), Some(500)).unwrap_err();
        let fields: Vec<_> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["page", "pageSize"]);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let req = PageRequest::new(Some(3), Some(25)).unwrap();
        assert_eq!(req.offset(), 50);
        assert_eq!(req.limit(), 25);
    }

    #[test]
    fn meta_for_partial_last_page() {
        let meta = PageMeta::new(PageRequest::new(Some(2), Some(10)).unwrap(), 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let last = PageMeta::new(PageRequest::new(Some(3), Some(10)).unwrap(), 25);
        assert!(!last.has_next);
    }

    #[test]
    fn meta_for_empty_result() {
        let meta = PageMeta::new(PageRequest::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn meta_serializes_camel_case() {
        let meta = PageMeta::new(PageRequest::default(), 1);
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "page": 1, "pageSize": 20, "totalCount": 1,
                "totalPages": 1, "hasNext": false, "hasPrev": false
            })
        );
    }

    #[test]
    fn sort_order_default_is_desc() {
        assert_eq!(SortOrder::default(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.apply(1.cmp(&2)), std::cmp::Ordering::Greater);
        let parsed: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(parsed.as_sql(), "ASC");
    }

    proptest! {
        #[test]
        fn total_pages_covers_every_row(total in 0u64..100_000, size in 1u32..=100) {
            let meta = PageMeta::new(PageRequest::new(Some(1), Some(size)).unwrap(), total);
            let size = u64::from(size);
            prop_assert!(meta.total_pages * size >= total);
            if total > 0 {
                prop_assert!((meta.total_pages - 1) * size < total);
            }
        }
    }
}
