// tests/reviewer_tests.rs
//
// PgReviewer tests need a running Postgres (DATABASE_URL) and return early
// without one. HttpReviewer tests run against an in-process axum service.

use std::time::Duration;

use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use sqlx::{PgPool, postgres::PgPoolOptions};
use testsystem::reviewer::{HttpReviewer, PgReviewer, QueryReviewer, Record};

fn record(pairs: &[(&str, Value)]) -> Record {
    Record(
        pairs
            .iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect(),
    )
}

/// A single-connection pool, so every call reuses the same session.
async fn sandbox_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    Some(pool)
}

#[tokio::test]
async fn test_pg_rows_keep_column_order_and_types() {
    let Some(pool) = sandbox_pool().await else { return };
    let reviewer = PgReviewer::new(pool, Duration::from_secs(2));

    let execution = reviewer
        .execute("SELECT 1 AS n, 'cat' AS pet, DATE '2024-03-01' AS day;")
        .await;

    assert_eq!(execution.error, None);
    assert_eq!(
        execution.records,
        vec![record(&[
            ("n", json!(1)),
            ("pet", json!("cat")),
            ("day", json!("2024-03-01")),
        ])]
    );
}

#[tokio::test]
async fn test_pg_repeated_column_names_are_compared_by_value() {
    let Some(pool) = sandbox_pool().await else { return };
    let reviewer = PgReviewer::new(pool, Duration::from_secs(2));

    let execution = reviewer.execute("SELECT 1 AS id, 2 AS id").await;
    assert_eq!(
        execution.records,
        vec![record(&[("id", json!(1)), ("id", json!(2))])]
    );

    let cmp = reviewer
        .execute_double("SELECT 1 AS id, 2 AS id", "SELECT 99 AS id, 2 AS id")
        .await;
    assert!(!cmp.is_equal);

    let cmp = reviewer
        .execute_double("SELECT 1 AS id, 2 AS id", "SELECT 1 AS a, 2 AS b")
        .await;
    assert!(cmp.is_equal);
}

#[tokio::test]
async fn test_pg_equivalence_ignores_row_order() {
    let Some(pool) = sandbox_pool().await else { return };
    let reviewer = PgReviewer::new(pool, Duration::from_secs(2));

    let right = "SELECT x FROM (VALUES (1), (2), (2)) AS t(x)";

    let cmp = reviewer
        .execute_double(right, "SELECT 2 AS y UNION ALL SELECT 1 UNION ALL SELECT 2")
        .await;
    assert!(cmp.is_equal);

    let cmp = reviewer
        .execute_double(right, "SELECT 1 AS y UNION ALL SELECT 2")
        .await;
    assert!(!cmp.is_equal);
}

#[tokio::test]
async fn test_pg_database_error_is_reported_in_band() {
    let Some(pool) = sandbox_pool().await else { return };
    let reviewer = PgReviewer::new(pool, Duration::from_secs(2));

    let missing = "SELECT * FROM no_such_table_for_grading";

    let execution = reviewer.execute(missing).await;
    assert_eq!(
        execution.error.as_deref(),
        Some("relation \"no_such_table_for_grading\" does not exist")
    );
    assert!(execution.records.is_empty());

    let cmp = reviewer.execute_double(missing, missing).await;
    assert!(!cmp.is_equal);
}

#[tokio::test]
async fn test_pg_writes_are_refused() {
    let Some(pool) = sandbox_pool().await else { return };

    sqlx::query("CREATE SEQUENCE IF NOT EXISTS grading_counter_seq")
        .execute(&pool)
        .await
        .unwrap();

    let reviewer = PgReviewer::new(pool, Duration::from_secs(2));
    let execution = reviewer.execute("SELECT nextval('grading_counter_seq')").await;

    let error = execution.error.expect("nextval must fail");
    assert!(error.contains("read-only transaction"), "{}", error);
}

#[tokio::test]
async fn test_pg_timeout_and_rollback_leave_connection_clean() {
    let Some(pool) = sandbox_pool().await else { return };
    let reviewer = PgReviewer::new(pool.clone(), Duration::from_millis(300));

    let execution = reviewer.execute("SELECT pg_sleep(3)").await;
    let error = execution.error.expect("sleep must be cancelled");
    assert!(error.contains("statement timeout"), "{}", error);

    // Same pooled connection: the transaction-local settings are gone
    let timeout: String = sqlx::query_scalar("SHOW statement_timeout")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_ne!(timeout, "300ms");

    let read_only: String = sqlx::query_scalar("SHOW transaction_read_only")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(read_only, "off");

    let execution = reviewer.execute("SELECT 1 AS one").await;
    assert_eq!(execution.records, vec![record(&[("one", json!(1))])]);
}

async fn stub_execute(Json(body): Json<Value>) -> Response {
    match body["query"].as_str() {
        // Raw text: repeated keys must reach the client untouched
        Some("db.pets.find()") => (
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"error": null, "records": [{"_id": 1, "name": "cat", "_id": 2}]}"#,
        )
            .into_response(),
        _ => Json(json!({"error": "unknown collection", "records": []})).into_response(),
    }
}

async fn stub_execute_double(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "is_equal": body["right_query"] == body["user_query"] }))
}

/// Serves a fake reviewer on a random port and returns its base URL.
async fn spawn_stub_reviewer() -> String {
    let app = Router::new()
        .route("/nosql/execute", post(stub_execute))
        .route("/nosql/execute_double", post(stub_execute_double))
        .route(
            "/broken/execute",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

fn stub_client(base: &str, path: &str) -> HttpReviewer {
    HttpReviewer::new(&format!("{}/{}", base, path), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_http_execute_decodes_remote_rows() {
    let base = spawn_stub_reviewer().await;
    let reviewer = stub_client(&base, "nosql");

    let execution = reviewer.execute("db.pets.find()").await;
    assert_eq!(execution.error, None);
    assert_eq!(
        execution.records,
        vec![record(&[
            ("_id", json!(1)),
            ("name", json!("cat")),
            ("_id", json!(2)),
        ])]
    );

    let execution = reviewer.execute("db.nope.find()").await;
    assert_eq!(execution.error.as_deref(), Some("unknown collection"));
    assert!(execution.records.is_empty());
}

#[tokio::test]
async fn test_http_execute_double_trusts_remote_verdict() {
    let base = spawn_stub_reviewer().await;
    let reviewer = stub_client(&base, "nosql/");

    assert!(reviewer.execute_double("db.a.find()", "db.a.find()").await.is_equal);
    assert!(!reviewer.execute_double("db.a.find()", "db.b.find()").await.is_equal);
}

#[tokio::test]
async fn test_http_server_error_is_reported_in_band() {
    let base = spawn_stub_reviewer().await;
    let reviewer = stub_client(&base, "broken");

    let execution = reviewer.execute("db.pets.find()").await;
    let error = execution.error.expect("a 500 must surface as an error");
    assert!(error.contains("500"), "{}", error);

    // No execute_double route on this base: 404 counts as not equal
    assert!(!reviewer.execute_double("a", "a").await.is_equal);
}
