// src/reviewer/http.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use super::{Comparison, Execution, QueryReviewer};

/// Client for a remote reviewer service (used for the NoSQL side).
///
/// Endpoints, relative to the base URL:
/// * `POST execute` with `{"query": ...}` answers an [`Execution`].
/// * `POST execute_double` with `{"right_query": ..., "user_query": ...}` answers a [`Comparison`].
#[derive(Clone)]
pub struct HttpReviewer {
    client: reqwest::Client,
    base: Url,
}

#[derive(Serialize)]
struct ExecuteBody<'a> {
    query: &'a str,
}

#[derive(Serialize)]
struct ExecuteDoubleBody<'a> {
    right_query: &'a str,
    user_query: &'a str,
}

impl HttpReviewer {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, String> {
        let mut base = Url::parse(base).map_err(|e| format!("invalid reviewer url: {}", e))?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| e.to_string())?;

        Ok(Self { client, base })
    }

    pub fn endpoint(&self, name: &str) -> Result<Url, String> {
        self.base.join(name).map_err(|e| e.to_string())
    }

    async fn post<B: Serialize + Sync, R: serde::de::DeserializeOwned>(
        &self,
        name: &str,
        body: &B,
    ) -> Result<R, String> {
        let url = self.endpoint(name)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        response.json::<R>().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl QueryReviewer for HttpReviewer {
    async fn execute(&self, query: &str) -> Execution {
        match self.post("execute", &ExecuteBody { query }).await {
            Ok(execution) => execution,
            Err(e) => {
                tracing::warn!("Remote reviewer execute failed: {}", e);
                Execution::failed(e)
            }
        }
    }

    async fn execute_double(&self, right_query: &str, user_query: &str) -> Comparison {
        let body = ExecuteDoubleBody {
            right_query,
            user_query,
        };
        match self.post("execute_double", &body).await {
            Ok(comparison) => comparison,
            Err(e) => {
                tracing::warn!("Remote reviewer execute_double failed: {}", e);
                Comparison { is_equal: false }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let reviewer =
            HttpReviewer::new("http://reviewer:8080/nosql", Duration::from_secs(1)).unwrap();

        assert_eq!(
            reviewer.endpoint("execute").unwrap().as_str(),
            "http://reviewer:8080/nosql/execute"
        );
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(HttpReviewer::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_reported_in_band() {
        let reviewer =
            HttpReviewer::new("http://127.0.0.1:9/", Duration::from_millis(500)).unwrap();

        let execution = reviewer.execute("db.items.find({})").await;
        assert!(execution.error.is_some());
        assert!(execution.records.is_empty());

        let comparison = reviewer.execute_double("a", "a").await;
        assert!(!comparison.is_equal);
    }
}
