//! Pagination utilities for service layer
//!
//! `Pagination` normalizes request input, `Page` is the `{ items, meta }`
//! envelope returned by search endpoints.

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    #[serde(default = "default_page")]
    pub page: u64,
    /// items per page
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 { 1 }
fn default_limit() -> u64 { 10 }

impl Pagination {
    pub fn new(page: u64, limit: u64) -> Self { Self { page, limit } }

    /// Clamp to sane defaults; returns `(zero-based page index, limit)`.
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let limit = self.limit.clamp(1, 1000);
        (page - 1, limit)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: default_page(), limit: default_limit() } }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub item_count: u64,
    pub total_items: u64,
    pub items_per_page: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

impl PageMeta {
    pub fn new(pagination: Pagination, item_count: u64, total_items: u64) -> Self {
        let (idx, limit) = pagination.normalize();
        Self {
            item_count,
            total_items,
            items_per_page: limit,
            total_pages: total_items.div_ceil(limit),
            current_page: idx + 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total_items: u64) -> Self {
        let meta = PageMeta::new(pagination, items.len() as u64, total_items);
        Self { items, meta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let (idx, per) = Pagination { page: 0, limit: 0 }.normalize();
        assert_eq!(idx, 0);
        assert_eq!(per, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let (idx, per) = Pagination { page: 5, limit: 5000 }.normalize();
        assert_eq!(idx, 4);
        assert_eq!(per, 1000);
    }

    #[test]
    fn meta_rounds_total_pages_up() {
        let meta = PageMeta::new(Pagination::new(2, 10), 10, 21);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.current_page, 2);
        assert_eq!(meta.items_per_page, 10);
    }

    #[test]
    fn default_values_are_sane() {
        let d = Pagination::default();
        assert_eq!(d.page, 1);
        assert_eq!(d.limit, 10);
    }
}
