// src/exam/grader.rs

use crate::{reviewer::Reviewers, utils::html::escape_to_html};

use super::{
    QuestionType, multi_right,
    multianswer::{self, AnswerOption},
    records::{AnswerChoice, DisplayRecords, OptionMark},
};

/// A question's canonical answer, decoded for its grading strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Canonical {
    SqlQuery(String),
    NoSqlQuery(String),
    MultiAnswer(Vec<AnswerOption>),
    MultiRightAnswer {
        /// Candidate answers in display order.
        choices: Vec<AnswerChoice>,
        /// Every accepted ordered sequence of answer IDs.
        right: Vec<Vec<i64>>,
    },
}

impl Canonical {
    /// Decodes the stored answer text. Multi-right questions keep their
    /// answers in separate tables, so the caller supplies them.
    pub fn from_answer(
        question_type: QuestionType,
        answer: &str,
        choices: Vec<AnswerChoice>,
        right: Vec<Vec<i64>>,
    ) -> Self {
        match question_type {
            QuestionType::SqlQuery => Canonical::SqlQuery(answer.to_string()),
            QuestionType::NoSqlQuery => Canonical::NoSqlQuery(answer.to_string()),
            QuestionType::MultiAnswer => {
                Canonical::MultiAnswer(multianswer::parse_options(answer))
            }
            QuestionType::MultiRightAnswer => Canonical::MultiRightAnswer { choices, right },
        }
    }
}

/// Decides whether `submitted` answers the question correctly.
///
/// Query questions defer to the reviewer's equivalence check; malformed
/// submissions for the other kinds are simply wrong.
pub async fn grade(canonical: &Canonical, submitted: &str, reviewers: &Reviewers) -> bool {
    match canonical {
        Canonical::SqlQuery(right) => {
            reviewers.sql.execute_double(right, submitted).await.is_equal
        }
        Canonical::NoSqlQuery(right) => {
            reviewers.nosql.execute_double(right, submitted).await.is_equal
        }
        Canonical::MultiAnswer(options) => multianswer::check(options, submitted),
        Canonical::MultiRightAnswer { right, .. } => multi_right::check(submitted, right),
    }
}

/// Display records for the canonical answer.
pub async fn right_records(canonical: &Canonical, reviewers: &Reviewers) -> DisplayRecords {
    match canonical {
        Canonical::SqlQuery(right) => {
            DisplayRecords::from_execution(reviewers.sql.execute(right).await)
        }
        Canonical::NoSqlQuery(right) => {
            DisplayRecords::from_execution(reviewers.nosql.execute(right).await)
        }
        Canonical::MultiAnswer(options) => DisplayRecords::canonical_options(options),
        Canonical::MultiRightAnswer { choices, .. } => DisplayRecords::Choices(choices.clone()),
    }
}

/// Display records for a submitted answer.
pub async fn user_records(
    canonical: &Canonical,
    submitted: &str,
    reviewers: &Reviewers,
) -> DisplayRecords {
    match canonical {
        Canonical::SqlQuery(_) => {
            DisplayRecords::from_execution(reviewers.sql.execute(submitted).await)
        }
        Canonical::NoSqlQuery(_) => {
            DisplayRecords::from_execution(reviewers.nosql.execute(submitted).await)
        }
        Canonical::MultiAnswer(options) => DisplayRecords::Options(
            options
                .iter()
                .enumerate()
                .map(|(i, o)| OptionMark {
                    text: o.text.clone(),
                    marked: multianswer::is_marked(submitted, i),
                })
                .collect(),
        ),
        Canonical::MultiRightAnswer { choices, .. } => {
            let selected = multi_right::parse_sequence(submitted)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|id| choices.iter().find(|c| c.id == id).cloned())
                .collect();
            DisplayRecords::Choices(selected)
        }
    }
}

/// Renders the student's last answer as HTML for admin views. Free-text
/// answers are escaped so the admin sees exactly what was submitted.
pub fn answer_html(question_type: QuestionType, submitted: &str) -> String {
    match question_type {
        QuestionType::MultiAnswer => submitted
            .chars()
            .enumerate()
            .filter(|(_, c)| *c == '1')
            .map(|(i, _)| format!("{}. + <br/>", i + 1))
            .collect(),
        QuestionType::SqlQuery | QuestionType::NoSqlQuery | QuestionType::MultiRightAnswer => {
            escape_to_html(submitted)
        }
    }
}
