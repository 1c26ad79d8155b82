//! Pagination types
//!
//! Requests handed to fetchers and the limits that bound a fetch.

use serde::{Deserialize, Serialize};

/// Default number of rows requested per page
pub const DEFAULT_BATCH_SIZE: i64 = 100;

/// Default cap on rows returned by one fetch
pub const DEFAULT_MAX_ROWS: i64 = 1000;

/// Slice of the logical dataset requested from a fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Zero-based position of the first row
    pub offset: usize,
    /// Number of rows requested; always the configured batch size
    pub limit: usize,
}

impl PageRequest {
    /// Create a new page request
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Position of the last row covered by this request (inclusive)
    ///
    /// Used by range-style transports such as `Range: items=0-99`.
    pub fn last_index(&self) -> usize {
        self.offset
            .saturating_add(self.limit)
            .saturating_sub(1)
    }

    /// Request for the page that follows this one
    pub fn next(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            limit: self.limit,
        }
    }
}

/// Validated pagination limits, both strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Rows requested per page
    pub batch_size: usize,
    /// Hard cap on rows returned
    pub max_rows: usize,
}

impl PageLimits {
    /// Validate raw limits; `None` when either is not strictly positive
    pub fn new(batch_size: i64, max_rows: i64) -> Option<Self> {
        let batch_size = usize::try_from(batch_size).ok().filter(|n| *n > 0)?;
        let max_rows = usize::try_from(max_rows).ok().filter(|n| *n > 0)?;
        Some(Self {
            batch_size,
            max_rows,
        })
    }

    /// Request for the first page
    pub fn first_request(&self) -> PageRequest {
        PageRequest::new(0, self.batch_size)
    }
}

/// Raw pagination settings as they appear in definitions and on the CLI
///
/// Values are kept signed so that misconfiguration such as `batch_size: -1`
/// deserializes and resolves to an empty fetch instead of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PaginationConfig {
    /// Rows requested per page
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Hard cap on rows returned
    #[serde(default = "default_max_rows")]
    pub max_rows: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl PaginationConfig {
    /// Create a new pagination config
    pub fn new(batch_size: i64, max_rows: i64) -> Self {
        Self {
            batch_size,
            max_rows,
        }
    }

    /// Override the batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Override the row cap
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: i64) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Validated limits, if both values are strictly positive
    pub fn limits(&self) -> Option<PageLimits> {
        PageLimits::new(self.batch_size, self.max_rows)
    }

    /// Whether a fetch with these settings would ever call its fetcher
    pub fn is_valid(&self) -> bool {
        self.limits().is_some()
    }
}

fn default_batch_size() -> i64 {
    DEFAULT_BATCH_SIZE
}

fn default_max_rows() -> i64 {
    DEFAULT_MAX_ROWS
}
