// src/exam/mod.rs

pub mod grader;
pub mod multi_right;
pub mod multianswer;
pub mod records;
pub mod timer;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Grading strategy of a question, stored as its signature in `questions.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
pub enum QuestionType {
    #[serde(rename = "SQL_query")]
    #[sqlx(rename = "SQL_query")]
    SqlQuery,
    #[serde(rename = "noSQL_query")]
    #[sqlx(rename = "noSQL_query")]
    NoSqlQuery,
    #[serde(rename = "Test_multianswer")]
    #[sqlx(rename = "Test_multianswer")]
    MultiAnswer,
    #[serde(rename = "multi_right_answer")]
    #[sqlx(rename = "multi_right_answer")]
    MultiRightAnswer,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::SqlQuery,
        QuestionType::NoSqlQuery,
        QuestionType::MultiAnswer,
        QuestionType::MultiRightAnswer,
    ];

    pub fn as_signature(&self) -> &'static str {
        match self {
            QuestionType::SqlQuery => "SQL_query",
            QuestionType::NoSqlQuery => "noSQL_query",
            QuestionType::MultiAnswer => "Test_multianswer",
            QuestionType::MultiRightAnswer => "multi_right_answer",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_signature())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionType::ALL
            .into_iter()
            .find(|t| t.as_signature() == s)
            .ok_or_else(|| format!("Unknown question type '{}'", s))
    }
}
