// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # bounded-pager
//!
//! Bounded offset pagination: pull a large dataset in fixed-size pages until
//! the source runs out or a row cap is reached.
//!
//! ## Features
//!
//! - **One primitive**: [`fetch_all`] works over any [`PageFetcher`]
//! - **HTTP sources**: query-parameter or `Range` header offsets, retries, rate limiting
//! - **SQL sources**: DuckDB, SQLite, PostgreSQL and MySQL through DuckDB
//! - **YAML definitions**: sources with `{{ config.* }}` / `{{ env.* }}` templates
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bounded_pager::{fetch_all, pagination::fetcher_fn, PageRequest};
//!
//! let fetcher = fetcher_fn(|req: PageRequest| async move {
//!     let rows: Vec<u64> = (req.offset..req.offset + req.limit)
//!         .filter(|n| *n < 250)
//!         .map(|n| n as u64)
//!         .collect();
//!     Ok::<_, std::convert::Infallible>(rows)
//! });
//!
//! // Pages of 100: offsets 0, 100, 200; the third page is short and ends the fetch
//! let rows = fetch_all(&fetcher, 100, 1000).await?;
//! assert_eq!(rows.len(), 250);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │   fetch_all(fetcher, batch_size, max_rows)            │
//! │   offset 0, B, 2B, ... until empty/short page or cap  │
//! └───────────────────────────┬───────────────────────────┘
//!                             │ PageFetcher::fetch_page
//!            ┌────────────────┼─────────────────┐
//!            │                │                 │
//!      HttpPageFetcher  DatabasePageFetcher  FnFetcher
//!      retry, backoff   DuckDB LIMIT/OFFSET  closures
//!      rate limit
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Bounded offset pagination
pub mod pagination;

/// HTTP client and page fetcher
pub mod http;

/// Database page fetching via DuckDB
pub mod database;

/// Template interpolation
pub mod template;

/// Source definitions
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::{load_definition, load_definition_from_str, SourceDefinition};
pub use pagination::{
    fetch_all, fetch_all_values, BoundedPaginator, DynValueFetcher, PageFetcher, PageRequest,
    PaginationConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
