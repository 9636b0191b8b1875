// src/reviewer/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions, types::Json};

use super::{Execution, QueryReviewer, Record};

/// Runs student SQL against a sandbox PostgreSQL database.
///
/// Each call checks out one connection, runs inside a READ ONLY transaction with
/// a statement timeout and always rolls back, so the connection goes back to the
/// pool clean whether the query succeeded or not.
#[derive(Clone)]
pub struct PgReviewer {
    pool: PgPool,
    timeout: Duration,
}

impl PgReviewer {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Builds a reviewer with a lazily connected pool.
    pub fn connect_lazy(database_url: &str, timeout: Duration) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_lazy(database_url)?;
        Ok(Self::new(pool, timeout))
    }

    async fn run(&self, query: &str) -> Result<Vec<Record>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        let set_timeout = format!(
            "SET LOCAL statement_timeout = {}",
            self.timeout.as_millis()
        );
        sqlx::query(&set_timeout).execute(&mut *tx).await?;

        // `json` (not `jsonb`) keeps repeated column names in the row text
        let wrapped = wrap_query(query);
        let rows: Vec<Json<Record>> = sqlx::query_scalar(&wrapped).fetch_all(&mut *tx).await?;

        tx.rollback().await?;

        Ok(rows.into_iter().map(|Json(record)| record).collect())
    }
}

/// `row_to_json` encodes dates as ISO-8601 strings and numerics as JSON numbers,
/// so any result shape survives serialisation.
fn wrap_query(query: &str) -> String {
    let query = query.trim().trim_end_matches(';').trim_end();
    format!("SELECT row_to_json(q) FROM ({}\n) AS q", query)
}

#[async_trait]
impl QueryReviewer for PgReviewer {
    async fn execute(&self, query: &str) -> Execution {
        match self.run(query).await {
            Ok(records) => Execution::ok(records),
            Err(sqlx::Error::Database(e)) => Execution::failed(e.message().to_string()),
            Err(e) => {
                tracing::warn!("SQL reviewer failed: {:?}", e);
                Execution::failed(e.to_string())
            }
        }
    }
}
