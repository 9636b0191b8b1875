// src/models/session.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::exam::{QuestionType, records::DisplayRecords, timer::TimeLeft};

use super::question::PublicQuestion;

/// Represents the 'user_sessions' table: one run of a user through a test.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSession {
    pub id: i64,
    pub user_id: i64,
    pub rk_id: i64,
    /// Which attempt of the user this session is (1-based).
    pub attempt: i16,
    pub running: bool,
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'session_questions' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionQuestion {
    pub id: i64,
    pub session_id: i64,
    pub question_id: i64,
    pub last_answer: String,
    /// Only meaningful once `answered_at` is set.
    pub is_right: bool,
    pub answered_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for (re)submitting an answer.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(max = 2000))]
    pub answer: String,
}

/// Current session as shown to the student.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session: UserSession,
    pub rk_title: String,
    pub time_left: TimeLeft,
    pub questions: Vec<PublicQuestion>,
}

/// One answered question inside an admin session report.
#[derive(Debug, Serialize, FromRow)]
pub struct SessionQuestionRow {
    pub id: i64,
    pub question_id: i64,
    pub question_type: QuestionType,
    pub description: String,
    pub last_answer: String,
    pub is_right: bool,
    pub answered_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SessionQuestionReport {
    #[serde(flatten)]
    pub row: SessionQuestionRow,
    pub last_answer_html: String,
}

/// A session joined with its test title, for admin reports.
#[derive(Debug, Serialize, FromRow)]
pub struct SessionSummary {
    pub id: i64,
    pub rk_id: i64,
    pub rk_title: String,
    pub attempt: i16,
    pub running: bool,
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionReport {
    #[serde(flatten)]
    pub session: SessionSummary,
    pub right_count: usize,
    pub questions: Vec<SessionQuestionReport>,
}

/// Canonical vs submitted records for one session question.
#[derive(Debug, Serialize)]
pub struct RecordsComparison {
    pub session_question_id: i64,
    pub is_right: bool,
    pub right_records: DisplayRecords,
    pub user_records: DisplayRecords,
}
