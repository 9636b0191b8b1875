// src/handlers/session.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    db::{questions, sessions},
    error::AppError,
    exam::{QuestionType, grader, timer::TimeLeft},
    models::{
        question::PublicQuestion,
        session::{SessionQuestion, SessionView, SubmitAnswerRequest},
    },
    reviewer::Reviewers,
    utils::{html::text_to_html, jwt::Claims},
};

/// Helper struct for a session question joined with its question.
struct QuestionSource {
    id: i64,
    question_id: i64,
    question_type: QuestionType,
    description: String,
    answer: String,
    last_answer: String,
}

/// Returns the caller's running session with its questions and time left.
///
/// Reading the session is what expires it; with nothing running the response
/// is just `{"time_left": {"status": "no_active_session"}}` (or `expired`).
pub async fn current_session(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;

    let left = sessions::refresh(&pool, user_id, config.time_for_attempt, Utc::now()).await?;
    if !left.is_running() {
        return Ok(Json(json!({ "time_left": left })).into_response());
    }

    let Some(session) = sessions::find_running(&pool, user_id).await? else {
        return Ok(Json(json!({ "time_left": TimeLeft::NoActiveSession })).into_response());
    };

    let rk_title = sqlx::query!("SELECT title FROM rks WHERE id = $1", session.rk_id)
        .fetch_one(&pool)
        .await?
        .title;

    let sources = sqlx::query_as!(
        QuestionSource,
        r#"
        SELECT
            sq.id,
            sq.question_id,
            q.type AS "question_type: QuestionType",
            q.description,
            q.answer,
            sq.last_answer
        FROM session_questions sq
        JOIN questions q ON q.id = sq.question_id
        WHERE sq.session_id = $1
        ORDER BY sq.id
        "#,
        session.id
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load session questions: {:?}", e);
        AppError::from(e)
    })?;

    let mut public = Vec::with_capacity(sources.len());
    for source in sources {
        let (options, choices) = match source.question_type {
            QuestionType::MultiAnswer => {
                (Some(PublicQuestion::option_texts(&source.answer)), None)
            }
            QuestionType::MultiRightAnswer => {
                (None, Some(questions::choices(&pool, source.question_id).await?))
            }
            QuestionType::SqlQuery | QuestionType::NoSqlQuery => (None, None),
        };

        public.push(PublicQuestion {
            id: source.id,
            question_id: source.question_id,
            question_type: source.question_type,
            description_html: text_to_html(&source.description),
            description: source.description,
            options,
            choices,
            last_answer: source.last_answer,
        });
    }

    Ok(Json(SessionView {
        session,
        rk_title,
        time_left: left,
        questions: public,
    })
    .into_response())
}

/// Stores and grades an answer to one question of the running session.
///
/// The verdict is persisted but not revealed to the student.
pub async fn submit_answer(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(reviewers): State<Reviewers>,
    Extension(claims): Extension<Claims>,
    Path(session_question_id): Path<i64>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let left = sessions::refresh(&pool, user_id, config.time_for_attempt, Utc::now()).await?;
    let TimeLeft::Running { session_id, minutes } = left else {
        return Err(AppError::Conflict("No running session".to_string()));
    };

    let session_question = sqlx::query_as!(
        SessionQuestion,
        r#"
        SELECT id, session_id, question_id, last_answer, is_right, answered_at
        FROM session_questions
        WHERE id = $1 AND session_id = $2
        "#,
        session_question_id,
        session_id
    )
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found in the running session".to_string()))?;

    let question = questions::find(&pool, session_question.question_id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let canonical = questions::canonical(&pool, &question).await?;
    let is_right = grader::grade(&canonical, &payload.answer, &reviewers).await;

    sqlx::query!(
        r#"
        UPDATE session_questions
        SET last_answer = $1, is_right = $2, answered_at = NOW()
        WHERE id = $3
        "#,
        payload.answer,
        is_right,
        session_question.id
    )
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save answer: {:?}", e);
        AppError::from(e)
    })?;

    tracing::debug!(
        "Graded session question {} ({}): {}",
        session_question.id,
        question.question_type,
        is_right
    );

    Ok(Json(json!({
        "id": session_question.id,
        "saved": true,
        "minutes_left": minutes
    })))
}

/// Hands in the running session early.
pub async fn finish_session(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let Some(session) = sessions::find_running(&pool, user_id).await? else {
        return Ok(Json(json!({ "finished": false, "time_left": TimeLeft::NoActiveSession })));
    };

    sessions::finish(&pool, session.id).await?;
    tracing::info!("User {} finished session {}", user_id, session.id);

    Ok(Json(json!({ "finished": true, "session_id": session.id })))
}
