// src/reviewer/mod.rs

//! Query execution collaborators used to grade `SQL_query` and `noSQL_query`
//! questions. Every failure is reported in-band through [`Execution::error`]
//! or a negative [`Comparison`], never as an `Err`.

pub mod http;
pub mod postgres;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use serde_json::Value;

pub use http::HttpReviewer;
pub use postgres::PgReviewer;

/// One result row: `(column, value)` pairs in column order.
///
/// Serialised as a JSON object. Repeated column names (`SELECT *` over a join)
/// are kept, both when decoding reviewer output and when rendering it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(pub Vec<(String, Value)>);

impl Record {
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, value)| value)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, value) in &self.0 {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a result row object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut columns = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, Value>()? {
                    columns.push(entry);
                }
                Ok(Record(columns))
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Outcome of running a single query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub error: Option<String>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Execution {
    pub fn ok(records: Vec<Record>) -> Self {
        Self {
            error: None,
            records,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            records: Vec::new(),
        }
    }
}

/// Outcome of running the canonical and the submitted query side by side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub is_equal: bool,
}

#[async_trait]
pub trait QueryReviewer: Send + Sync {
    async fn execute(&self, query: &str) -> Execution;

    /// Runs both queries and reports whether their results are equivalent.
    /// A query that errors is never equal to anything, including another error.
    async fn execute_double(&self, right_query: &str, user_query: &str) -> Comparison {
        let right = self.execute(right_query).await;
        let user = self.execute(user_query).await;
        Comparison {
            is_equal: results_equal(&right, &user),
        }
    }
}

/// Both executions succeeded and hold the same multiset of rows.
/// Rows are compared by their column values in order; column names are ignored.
pub fn results_equal(right: &Execution, user: &Execution) -> bool {
    if right.error.is_some() || user.error.is_some() {
        return false;
    }
    if right.records.len() != user.records.len() {
        return false;
    }

    let mut right_rows: Vec<String> = right.records.iter().map(row_signature).collect();
    let mut user_rows: Vec<String> = user.records.iter().map(row_signature).collect();
    right_rows.sort_unstable();
    user_rows.sort_unstable();
    right_rows == user_rows
}

fn row_signature(record: &Record) -> String {
    Value::Array(record.values().cloned().collect()).to_string()
}

/// Stand-in used when no backend is configured for a query language.
#[derive(Debug, Clone)]
pub struct Unconfigured {
    language: &'static str,
}

impl Unconfigured {
    pub fn new(language: &'static str) -> Self {
        Self { language }
    }
}

#[async_trait]
impl QueryReviewer for Unconfigured {
    async fn execute(&self, _query: &str) -> Execution {
        Execution::failed(format!("{} reviewer is not configured", self.language))
    }
}

/// The SQL and NoSQL capability sets, shared across requests.
#[derive(Clone)]
pub struct Reviewers {
    pub sql: Arc<dyn QueryReviewer>,
    pub nosql: Arc<dyn QueryReviewer>,
}

impl Reviewers {
    pub fn new(sql: Arc<dyn QueryReviewer>, nosql: Arc<dyn QueryReviewer>) -> Self {
        Self { sql, nosql }
    }

    pub fn unconfigured() -> Self {
        Self::new(
            Arc::new(Unconfigured::new("SQL")),
            Arc::new(Unconfigured::new("NoSQL")),
        )
    }
}
