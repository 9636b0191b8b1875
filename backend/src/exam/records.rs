// src/exam/records.rs

use serde::{Serialize, Serializer, ser::SerializeTuple};

use crate::reviewer::{Execution, Record};

use super::multianswer::AnswerOption;

/// A `[text, "+"]` / `[text, ""]` pair shown for multianswer questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMark {
    pub text: String,
    pub marked: bool,
}

impl Serialize for OptionMark {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.text)?;
        tuple.serialize_element(if self.marked { "+" } else { "" })?;
        tuple.end()
    }
}

/// A candidate answer of a multi-right-answer question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AnswerChoice {
    pub id: i64,
    pub text: String,
}

/// What the admin sees for one side (canonical or submitted) of an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayRecords {
    QueryError { query_error: String },
    Rows(Vec<Record>),
    Options(Vec<OptionMark>),
    Choices(Vec<AnswerChoice>),
}

impl DisplayRecords {
    /// A failed execution becomes `{"query_error": ...}` and drops any records.
    pub fn from_execution(execution: Execution) -> Self {
        match execution.error {
            Some(query_error) => DisplayRecords::QueryError { query_error },
            None => DisplayRecords::Rows(execution.records),
        }
    }

    pub fn canonical_options(options: &[AnswerOption]) -> Self {
        DisplayRecords::Options(
            options
                .iter()
                .map(|o| OptionMark {
                    text: o.text.clone(),
                    marked: o.is_correct,
                })
                .collect(),
        )
    }
}
