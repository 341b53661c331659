use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 50;

/// A validated 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Limits above the maximum are capped; zero or negative values are rejected.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if limit < 1 {
            return Err(AppError::validation("limit must be at least 1"));
        }
        Ok(Self {
            page,
            limit: limit.min(MAX_PAGE_SIZE),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub has_more: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let has_more = request.offset() + (items.len() as i64) < total;
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            has_more,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_absent() {
        let req = PageRequest::new(None, None).unwrap();
        assert_eq!(req, PageRequest::default());
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn limit_is_capped_at_fifty() {
        let req = PageRequest::new(Some(3), Some(500)).unwrap();
        assert_eq!(req.limit, 50);
        assert_eq!(req.offset(), 100);
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(matches!(
            PageRequest::new(Some(0), None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            PageRequest::new(None, Some(0)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn has_more_reflects_remaining_rows() {
        let req = PageRequest::new(Some(1), Some(2)).unwrap();
        assert!(Paginated::new(vec![1, 2], req, 3).has_more);
        assert!(!Paginated::new(vec![1, 2], req, 2).has_more);
    }
}
