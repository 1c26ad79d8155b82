//! Database integration tests
//!
//! File-backed tests build a throwaway DuckDB database under a temp dir and
//! page over it through the read-only `source_db` attachment.
//!
//! The PostgreSQL test requires a live database.
//! Set POSTGRES_TEST_URL environment variable to run it.

use bounded_pager::config::load_definition_from_str;
use bounded_pager::database::{
    DatabaseConnection, DatabaseEngine, DatabasePageFetcher, DatabaseSource, DbType,
};
use bounded_pager::{
    fetch_all, fetch_all_values, BoundedPaginator, Error, PageFetcher, PageRequest,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

/// Get test connection string from environment or skip
fn get_test_connection() -> Option<String> {
    std::env::var("POSTGRES_TEST_URL").ok()
}

/// Create a DuckDB file with an `incidents` table of `count` rows
fn create_incidents_db(dir: &Path, count: usize) -> String {
    let db_path = dir.join("incidents.duckdb");
    let conn = duckdb::Connection::open(&db_path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE incidents AS
         SELECT i AS id,
                'incident ' || i AS title,
                CASE WHEN i % 2 = 0 THEN 'open' ELSE 'closed' END AS status
         FROM range({count}) AS t(i);"
    ))
    .unwrap();
    drop(conn);
    db_path.to_string_lossy().to_string()
}

fn open_file_engine(path: &str) -> DatabaseEngine {
    DatabaseEngine::open(
        DbType::Duckdb,
        &DatabaseConnection::from_connection_string(path),
    )
    .unwrap()
}

fn ids(rows: &[Value]) -> Vec<i64> {
    rows.iter().filter_map(|r| r["id"].as_i64()).collect()
}

#[tokio::test]
async fn test_page_over_attached_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_incidents_db(dir.path(), 23);

    let engine = open_file_engine(&path);
    assert!(engine.is_attached());

    let source = DatabaseSource::table("incidents").order_by("id");
    let fetcher = DatabasePageFetcher::new(engine, &source).unwrap();
    assert_eq!(fetcher.base_query(), "SELECT * FROM source_db.incidents");

    let rows = fetch_all(&fetcher, 10, 1000).await.unwrap();
    assert_eq!(rows.len(), 23);
    assert_eq!(ids(&rows), (0..23).collect::<Vec<_>>());
    assert_eq!(
        rows[3],
        json!({"id": 3, "title": "incident 3", "status": "closed"})
    );
}

#[tokio::test]
async fn test_row_cap_truncates_last_page() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_incidents_db(dir.path(), 100);

    let source = DatabaseSource::table("incidents").order_by("id DESC");
    let fetcher = DatabasePageFetcher::new(open_file_engine(&path), &source).unwrap();

    let rows = BoundedPaginator::with_limits(20, 45)
        .fetch_all(&fetcher)
        .await
        .unwrap();

    assert_eq!(rows.len(), 45);
    assert_eq!(rows[0]["id"], 99);
    assert_eq!(rows[44]["id"], 55);
}

#[tokio::test]
async fn test_query_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_incidents_db(dir.path(), 30);

    let source = DatabaseSource::query(
        "SELECT id, title FROM source_db.incidents WHERE status = 'open';",
    )
    .order_by("id");
    let fetcher = DatabasePageFetcher::new(open_file_engine(&path), &source).unwrap();

    let rows = fetch_all(&fetcher, 4, 100).await.unwrap();
    assert_eq!(rows.len(), 15);
    assert!(rows.iter().all(|r| r["id"].as_i64().unwrap() % 2 == 0));
    assert!(rows.iter().all(|r| r.get("status").is_none()));
}

#[tokio::test]
async fn test_single_row_page() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_incidents_db(dir.path(), 5);

    let source = DatabaseSource::table("incidents").order_by("id");
    let fetcher = DatabasePageFetcher::new(open_file_engine(&path), &source).unwrap();

    let page = fetcher.fetch_page(PageRequest::new(4, 1)).await.unwrap();
    assert_eq!(ids(&page), vec![4]);

    let past_end = fetcher.fetch_page(PageRequest::new(5, 1)).await.unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn test_attachment_is_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_incidents_db(dir.path(), 3);
    let engine = open_file_engine(&path);

    let result = engine.execute_batch("DELETE FROM source_db.incidents");
    assert!(matches!(result, Err(Error::Database { .. })));
}

#[tokio::test]
async fn test_missing_table_and_query_rejected() {
    let engine = DatabaseEngine::open_in_memory().unwrap();
    let result = DatabasePageFetcher::new(engine, &DatabaseSource::default());
    assert!(matches!(result, Err(Error::InvalidConfigValue { .. })));
}

#[tokio::test]
async fn test_unknown_table_propagates_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_incidents_db(dir.path(), 3);

    let source = DatabaseSource::table("no_such_table");
    let fetcher = DatabasePageFetcher::new(open_file_engine(&path), &source).unwrap();

    let err = fetch_all(&fetcher, 10, 10).await.unwrap_err();
    assert!(matches!(err, Error::Database { .. }));
}

#[tokio::test]
async fn test_definition_over_duckdb_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_incidents_db(dir.path(), 12);

    let yaml = format!(
        r#"
name: incidents
batch_size: 5
max_rows: 8
source:
  type: database
  engine: duckdb
  connection_string: "{path}"
  table: incidents
  order_by: id
"#
    );
    let definition = load_definition_from_str(&yaml).unwrap();
    let fetcher = definition.build_fetcher().unwrap();

    let rows = definition
        .paginator()
        .fetch_all_values(fetcher.as_ref())
        .await
        .unwrap();
    assert_eq!(ids(&rows), (0..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_infinite_dates_do_not_abort_fetch() {
    let engine = DatabaseEngine::open_in_memory().unwrap();
    engine
        .execute_batch(
            "CREATE TABLE t (id INTEGER, d DATE);
             INSERT INTO t VALUES (1, 'infinity'::DATE), (2, '-infinity'::DATE), (3, DATE '2024-02-29');",
        )
        .unwrap();

    let fetcher =
        DatabasePageFetcher::new(engine, &DatabaseSource::table("t").order_by("id")).unwrap();
    let rows = fetch_all_values(&fetcher, 10, 10).await.unwrap();

    assert_eq!(
        rows,
        vec![
            json!({"id": 1, "d": "infinity"}),
            json!({"id": 2, "d": "-infinity"}),
            json!({"id": 3, "d": "2024-02-29"}),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shared_fetcher_across_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let path = create_incidents_db(dir.path(), 40);

    let source = DatabaseSource::table("incidents").order_by("id");
    let fetcher = Arc::new(DatabasePageFetcher::new(open_file_engine(&path), &source).unwrap());

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let fetcher = Arc::clone(&fetcher);
            tokio::spawn(async move { fetcher.fetch_page(PageRequest::new(i * 10, 10)).await })
        })
        .collect();

    let mut all_ids = Vec::new();
    for task in tasks {
        all_ids.extend(ids(&task.await.unwrap().unwrap()));
    }
    all_ids.sort_unstable();
    assert_eq!(all_ids, (0..40).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_postgres_table_pages() {
    let Some(conn_str) = get_test_connection() else {
        println!("Skipping: POSTGRES_TEST_URL not set");
        return;
    };

    let engine = DatabaseEngine::open(
        DbType::Postgres,
        &DatabaseConnection::from_connection_string(conn_str),
    )
    .unwrap();
    engine.check_connection().unwrap();

    let tables = engine.list_tables().unwrap();
    println!("Found {} tables", tables.len());
    let Some(table) = tables.first() else {
        println!("Skipping: no tables in test database");
        return;
    };

    let fetcher =
        DatabasePageFetcher::new(engine, &DatabaseSource::table(table.clone())).unwrap();
    let rows = fetch_all(&fetcher, 5, 12).await.unwrap();
    assert!(rows.len() <= 12);
}
