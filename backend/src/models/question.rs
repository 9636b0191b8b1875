// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::exam::{QuestionType, multianswer, records::AnswerChoice};

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: i64,

    pub rk_id: Option<i64>,

    /// Mapped from the 'type' column, which holds the type signature.
    #[sqlx(rename = "type")]
    pub question_type: QuestionType,

    pub description: String,

    /// Canonical answer: a query, or the `++`-marked option list for
    /// multianswer questions. Empty for multi-right-answer questions.
    pub answer: String,

    pub is_active: bool,

    pub registered_at: chrono::DateTime<chrono::Utc>,
}

/// What a student sees of a question: never the canonical answer.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    /// The `session_questions` row the student answers through.
    pub id: i64,
    pub question_id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub description: String,
    pub description_html: String,
    /// Option texts without correctness markers (multianswer only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Candidate answers (multi-right-answer only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<AnswerChoice>>,
    pub last_answer: String,
}

impl PublicQuestion {
    pub fn option_texts(answer: &str) -> Vec<String> {
        multianswer::parse_options(answer)
            .into_iter()
            .map(|o| o.text)
            .collect()
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub rk_id: Option<i64>,
    pub question_type: QuestionType,
    #[validate(length(min = 1, max = 10000))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub answer: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl CreateQuestionRequest {
    /// Every type except multi-right-answer keeps its canonical answer inline.
    pub fn check_answer(&self) -> Result<(), validator::ValidationError> {
        match self.question_type {
            QuestionType::SqlQuery | QuestionType::NoSqlQuery if self.answer.trim().is_empty() => {
                Err(validator::ValidationError::new("query_answer_required"))
            }
            QuestionType::MultiAnswer if multianswer::parse_options(&self.answer).is_empty() => {
                Err(validator::ValidationError::new("options_cannot_be_empty"))
            }
            _ => Ok(()),
        }
    }
}

/// DTO for editing a question. Retiring a question that students already
/// answered goes through `is_active`; its recorded answers stay intact.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 10000))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// DTO for adding a candidate answer to a multi-right-answer question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnswerRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    #[serde(default = "default_order")]
    pub display_order_number: i32,
}

fn default_order() -> i32 {
    1
}

/// DTO for registering an ordered right answer.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRightAnswerRequest {
    #[validate(length(min = 1, max = 100))]
    pub answer_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question_type: QuestionType, answer: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            rk_id: None,
            question_type,
            description: "Pick".to_string(),
            answer: answer.to_string(),
            is_active: true,
        }
    }

    #[test]
    fn test_check_answer_per_type() {
        assert!(request(QuestionType::SqlQuery, "SELECT 1").check_answer().is_ok());
        assert!(request(QuestionType::SqlQuery, "  ").check_answer().is_err());
        assert!(request(QuestionType::MultiAnswer, "\n \n").check_answer().is_err());
        assert!(request(QuestionType::MultiAnswer, "++a\nb").check_answer().is_ok());
        assert!(request(QuestionType::MultiRightAnswer, "").check_answer().is_ok());
    }

    #[test]
    fn test_option_texts_hide_markers() {
        assert_eq!(PublicQuestion::option_texts("++cat\ndog"), vec!["cat", "dog"]);
    }

    #[test]
    fn test_create_request_reads_signature() {
        let req: CreateQuestionRequest = serde_json::from_value(serde_json::json!({
            "question_type": "Test_multianswer",
            "description": "Pets?",
            "answer": "++cat\ndog"
        }))
        .unwrap();

        assert_eq!(req.question_type, QuestionType::MultiAnswer);
        assert!(req.is_active);
    }
}
