//! Pagination module
//!
//! Bounded offset pagination over any page source.
//!
//! # Overview
//!
//! [`fetch_all`] asks a [`PageFetcher`] for `(offset, batch_size)` slices,
//! advancing the offset by `batch_size` after each page, and stops on an
//! empty page, a short page, or once `max_rows` items are collected. The
//! primitive is stateless and does no I/O of its own.

mod fetcher;
mod paginator;
mod types;

pub use fetcher::{
    fetcher_fn, value_fetcher_fn, DynValueFetcher, FnFetcher, PageFetcher, ValueFetchFn,
};
pub use paginator::{fetch_all, fetch_all_values, fetch_with_limits, BoundedPaginator};
pub use types::{
    PageLimits, PageRequest, PaginationConfig, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ROWS,
};
