//! SQL page fetcher
//!
//! Runs `LIMIT/OFFSET` windows of a table or query through a
//! [`DatabaseEngine`].

use super::engine::DatabaseEngine;
use super::types::DatabaseSource;
use crate::error::{Error, Result};
use crate::pagination::{PageFetcher, PageRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

/// Page fetcher over a SQL table or query
///
/// DuckDB connections are not `Sync`, so the engine sits behind a mutex;
/// pages from one fetcher are served one at a time. Queries run on the
/// blocking thread pool so a large page does not stall the async workers.
#[derive(Debug)]
pub struct DatabasePageFetcher {
    engine: Arc<Mutex<DatabaseEngine>>,
    base_query: String,
    order_by: Option<String>,
}

impl DatabasePageFetcher {
    /// Create a fetcher for `source`
    pub fn new(engine: DatabaseEngine, source: &DatabaseSource) -> Result<Self> {
        source.validate()?;

        let base_query = match (&source.table, &source.query) {
            (Some(table), _) => format!("SELECT * FROM {}", engine.table_ref(table)),
            (None, Some(query)) => query.clone(),
            (None, None) => return Err(Error::missing_field("table")),
        };

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            base_query,
            order_by: source.order_by.clone(),
        })
    }

    /// Query every page is cut from
    pub fn base_query(&self) -> &str {
        &self.base_query
    }

    /// Lock the underlying engine
    pub fn engine(&self) -> Result<MutexGuard<'_, DatabaseEngine>> {
        lock_engine(&self.engine)
    }
}

#[async_trait]
impl PageFetcher for DatabasePageFetcher {
    type Item = Value;
    type Error = Error;

    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Value>> {
        let engine = Arc::clone(&self.engine);
        let base_query = self.base_query.clone();
        let order_by = self.order_by.clone();

        let records = tokio::task::spawn_blocking(move || {
            let engine = lock_engine(&engine)?;
            engine.query_page(&base_query, order_by.as_deref(), request)
        })
        .await
        .map_err(|e| Error::database(format!("Page query task failed: {e}")))??;

        tracing::debug!(
            offset = request.offset,
            limit = request.limit,
            count = records.len(),
            "Fetched database page"
        );
        Ok(records)
    }
}

fn lock_engine(engine: &Mutex<DatabaseEngine>) -> Result<MutexGuard<'_, DatabaseEngine>> {
    engine
        .lock()
        .map_err(|_| Error::database("database engine lock poisoned"))
}
