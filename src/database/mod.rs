//! Database page fetching via DuckDB
//!
//! DuckDB is the query engine. It reads native DuckDB files and attaches
//! PostgreSQL, MySQL and SQLite through its extensions.

mod engine;
mod fetcher;
mod types;

pub use engine::{mask_password, paged_query, DatabaseEngine, IN_MEMORY, SOURCE_CATALOG};
pub use fetcher::DatabasePageFetcher;
pub use types::{DatabaseConnection, DatabaseSource, DbType};
