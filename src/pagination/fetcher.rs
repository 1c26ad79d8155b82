//! Page fetcher capability
//!
//! A fetcher turns a [`PageRequest`] into one page of items. The paginator
//! knows nothing about what backs it: REST, SQL or an in-memory fixture.

use super::types::PageRequest;
use crate::error::Error;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Source of pages for the bounded paginator
///
/// Implementations own all error classification. Retries, backoff and
/// cancellation belong here and never in the paginator.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Item type of a page
    type Item: Send;
    /// Error reported by a failed fetch
    type Error: Send;

    /// Fetch the rows in `[offset, offset + limit)`
    ///
    /// Returning fewer than `limit` rows signals the last page.
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Self::Item>, Self::Error>;
}

#[async_trait]
impl<F: PageFetcher + ?Sized> PageFetcher for &F {
    type Item = F::Item;
    type Error = F::Error;

    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Self::Item>, Self::Error> {
        (**self).fetch_page(request).await
    }
}

#[async_trait]
impl<F: PageFetcher + ?Sized> PageFetcher for Box<F> {
    type Item = F::Item;
    type Error = F::Error;

    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Self::Item>, Self::Error> {
        (**self).fetch_page(request).await
    }
}

#[async_trait]
impl<F: PageFetcher + ?Sized> PageFetcher for Arc<F> {
    type Item = F::Item;
    type Error = F::Error;

    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Self::Item>, Self::Error> {
        (**self).fetch_page(request).await
    }
}

/// Untyped fetcher: JSON rows and the crate error, usable as a trait object
pub type DynValueFetcher = dyn PageFetcher<Item = Value, Error = Error>;

/// Boxed closure form of an untyped fetcher
pub type ValueFetchFn =
    Box<dyn Fn(PageRequest) -> BoxFuture<'static, crate::Result<Vec<Value>>> + Send + Sync>;

/// Adapts an async closure into a [`PageFetcher`]
///
/// ```rust,ignore
/// let fetcher = fetcher_fn(|req: PageRequest| async move {
///     Ok::<_, std::io::Error>(rows[req.offset.min(rows.len())..].to_vec())
/// });
/// ```
#[derive(Clone)]
pub struct FnFetcher<F> {
    f: F,
}

impl<F> FnFetcher<F> {
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> std::fmt::Debug for FnFetcher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnFetcher").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut, T, E> PageFetcher for FnFetcher<F>
where
    F: Fn(PageRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = T;
    type Error = E;

    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<T>, E> {
        (self.f)(request).await
    }
}

/// Shorthand for [`FnFetcher::new`]
pub fn fetcher_fn<F>(f: F) -> FnFetcher<F> {
    FnFetcher::new(f)
}

/// Box a closure returning boxed futures into an untyped fetcher
pub fn value_fetcher_fn<F>(f: F) -> FnFetcher<ValueFetchFn>
where
    F: Fn(PageRequest) -> BoxFuture<'static, crate::Result<Vec<Value>>> + Send + Sync + 'static,
{
    FnFetcher::new(Box::new(f))
}
