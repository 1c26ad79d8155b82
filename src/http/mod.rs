//! HTTP module
//!
//! REST page fetching with retry, backoff and rate limiting.
//!
//! # Features
//!
//! - **Automatic Retries**: transient failures are retried inside the fetcher,
//!   never by the paginator
//! - **Rate Limiting**: token bucket rate limiter using governor
//! - **Offset Styles**: offset/limit query parameters or a `Range` header

mod client;
mod fetcher;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, PageParams};
pub use fetcher::{extract_records, HttpPageFetcher, OffsetStyle};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
