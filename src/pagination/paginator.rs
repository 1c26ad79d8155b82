//! Bounded offset paginator
//!
//! Pulls fixed-size pages from a [`PageFetcher`] until the source runs dry
//! or the row cap is hit. Pages are requested strictly in sequence and the
//! result preserves fetch order exactly.

use super::fetcher::{DynValueFetcher, PageFetcher};
use super::types::{PageLimits, PaginationConfig};
use serde_json::Value;

/// Fetch up to `max_rows` items in pages of `batch_size`
///
/// Non-positive `batch_size` or `max_rows` yields an empty result without
/// calling the fetcher. The first fetch error is returned unchanged and
/// everything accumulated so far is dropped.
///
/// Termination:
/// - an empty page ends the fetch;
/// - a page shorter than `batch_size` is the last page;
/// - the accumulation reaching `max_rows` stops further requests, and the
///   final page is truncated to the cap.
///
/// A page of exactly `batch_size` items never ends the fetch on its own, so a
/// source whose size is a multiple of `batch_size` costs one extra, empty
/// request.
pub async fn fetch_all<F>(
    fetcher: &F,
    batch_size: i64,
    max_rows: i64,
) -> Result<Vec<F::Item>, F::Error>
where
    F: PageFetcher + ?Sized,
{
    match PageLimits::new(batch_size, max_rows) {
        Some(limits) => fetch_with_limits(fetcher, limits).await,
        None => Ok(Vec::new()),
    }
}

/// Untyped variant of [`fetch_all`] over JSON rows
///
/// Takes a trait object instead of a type parameter; behavior is identical.
pub async fn fetch_all_values(
    fetcher: &DynValueFetcher,
    batch_size: i64,
    max_rows: i64,
) -> crate::Result<Vec<Value>> {
    fetch_all(fetcher, batch_size, max_rows).await
}

/// Run the accumulation loop with already validated limits
pub async fn fetch_with_limits<F>(
    fetcher: &F,
    limits: PageLimits,
) -> Result<Vec<F::Item>, F::Error>
where
    F: PageFetcher + ?Sized,
{
    let mut rows = Vec::new();
    let mut request = limits.first_request();

    while rows.len() < limits.max_rows {
        let page = fetcher.fetch_page(request).await?;
        if page.is_empty() {
            break;
        }

        let page_len = page.len();
        rows.extend(page);
        request = request.next();

        if page_len < limits.batch_size {
            break;
        }
    }

    rows.truncate(limits.max_rows);
    Ok(rows)
}

/// Paginator bound to a fixed [`PaginationConfig`]
///
/// Holds only the limits; every call starts a fresh accumulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundedPaginator {
    config: PaginationConfig,
}

impl BoundedPaginator {
    /// Create a paginator with the given limits
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    /// Create a paginator from raw limits
    pub fn with_limits(batch_size: i64, max_rows: i64) -> Self {
        Self::new(PaginationConfig::new(batch_size, max_rows))
    }

    /// Configured limits
    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Fetch up to the configured row cap from `fetcher`
    pub async fn fetch_all<F>(&self, fetcher: &F) -> Result<Vec<F::Item>, F::Error>
    where
        F: PageFetcher + ?Sized,
    {
        fetch_all(fetcher, self.config.batch_size, self.config.max_rows).await
    }

    /// Untyped variant of [`BoundedPaginator::fetch_all`]
    pub async fn fetch_all_values(&self, fetcher: &DynValueFetcher) -> crate::Result<Vec<Value>> {
        fetch_all_values(fetcher, self.config.batch_size, self.config.max_rows).await
    }
}
