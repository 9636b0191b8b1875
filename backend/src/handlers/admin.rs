// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    config::Config,
    db::{questions, sessions},
    error::AppError,
    exam::{QuestionType, grader},
    models::{
        question::{
            CreateAnswerRequest, CreateQuestionRequest, CreateRightAnswerRequest, Question,
            UpdateQuestionRequest,
        },
        rk::{CreateRkRequest, Rk, UpdateRkRequest},
        session::{
            RecordsComparison, SessionQuestionReport, SessionQuestionRow, SessionReport,
            SessionSummary,
        },
        user::User,
    },
    reviewer::Reviewers,
};

/// Where admin lookups that miss fall back to.
pub const ADMIN_INDEX: &str = "/api/admin/users";

/// Lists all students (non-admin users).
pub async fn list_students(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as!(
        User,
        r#"
        SELECT id, username, password, role, created_at
        FROM users
        WHERE role <> 'admin'
        ORDER BY username
        "#
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub login: Option<String>,
}

/// Session history of one student.
///
/// Expires the student's running session first if its time is up, then lists
/// every session (test desc, attempt desc) with per-question verdicts.
/// A missing or unknown `login` redirects back to the user list.
pub async fn user_stats(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Query(params): Query<StatsParams>,
) -> Result<Response, AppError> {
    let Some(login) = params.login else {
        return Ok(Redirect::to(ADMIN_INDEX).into_response());
    };

    let user = sqlx::query_as!(
        User,
        "SELECT id, username, password, role, created_at FROM users WHERE username = $1",
        login
    )
    .fetch_optional(&pool)
    .await?;

    let Some(user) = user else {
        tracing::debug!("Stats requested for unknown user '{}'", login);
        return Ok(Redirect::to(ADMIN_INDEX).into_response());
    };

    let time_left = sessions::refresh(&pool, user.id, config.time_for_attempt, Utc::now()).await?;

    let summaries = sqlx::query_as!(
        SessionSummary,
        r#"
        SELECT s.id, s.rk_id, r.title AS rk_title, s.attempt, s.running, s.registered_at
        FROM user_sessions s
        JOIN rks r ON r.id = s.rk_id
        WHERE s.user_id = $1
        ORDER BY s.rk_id DESC, s.attempt DESC
        "#,
        user.id
    )
    .fetch_all(&pool)
    .await?;

    let mut reports = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let rows = sqlx::query_as!(
            SessionQuestionRow,
            r#"
            SELECT
                sq.id,
                sq.question_id,
                q.type AS "question_type: QuestionType",
                q.description,
                sq.last_answer,
                sq.is_right,
                sq.answered_at
            FROM session_questions sq
            JOIN questions q ON q.id = sq.question_id
            WHERE sq.session_id = $1
            ORDER BY sq.id
            "#,
            summary.id
        )
        .fetch_all(&pool)
        .await?;

        let questions: Vec<SessionQuestionReport> = rows
            .into_iter()
            .map(|row| SessionQuestionReport {
                last_answer_html: grader::answer_html(row.question_type, &row.last_answer),
                row,
            })
            .collect();

        reports.push(SessionReport {
            right_count: questions.iter().filter(|q| q.row.is_right).count(),
            session: summary,
            questions,
        });
    }

    Ok(Json(serde_json::json!({
        "student": user,
        "time_left": time_left,
        "sessions": reports
    }))
    .into_response())
}

/// Canonical and submitted records of one answered session question.
pub async fn session_question_records(
    State(pool): State<PgPool>,
    State(reviewers): State<Reviewers>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = sqlx::query!(
        r#"
        SELECT question_id, last_answer, is_right, answered_at IS NOT NULL AS "answered!"
        FROM session_questions
        WHERE id = $1
        "#,
        id
    )
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Session question not found".to_string()))?;

    if !row.answered {
        return Err(AppError::BadRequest("Question has not been answered yet".to_string()));
    }

    let question = questions::find(&pool, row.question_id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;
    let canonical = questions::canonical(&pool, &question).await?;

    Ok(Json(RecordsComparison {
        session_question_id: id,
        is_right: row.is_right,
        right_records: grader::right_records(&canonical, &reviewers).await,
        user_records: grader::user_records(&canonical, &row.last_answer, &reviewers).await,
    }))
}

/// Lists every test, open or not.
pub async fn list_rks(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let rks = sqlx::query_as!(
        Rk,
        "SELECT id, title, description, is_active, registered_at FROM rks ORDER BY id"
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(rks))
}

pub async fn create_rk(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateRkRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let rk = sqlx::query_as!(
        Rk,
        r#"
        INSERT INTO rks (title, description, is_active)
        VALUES ($1, $2, $3)
        RETURNING id, title, description, is_active, registered_at
        "#,
        payload.title,
        payload.description,
        payload.is_active
    )
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create test: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(rk)))
}

/// Updates a test by ID; opening and closing it goes through `is_active`.
pub async fn update_rk(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRkRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.title.is_none() && payload.description.is_none() && payload.is_active.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE rks SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(is_active) = payload.is_active {
        separated.push("is_active = ");
        separated.push_bind_unseparated(is_active);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update test: {:?}", e);
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Test not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Questions of one test, canonical answers included.
pub async fn list_rk_questions(
    State(pool): State<PgPool>,
    Path(rk_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as!(
        Question,
        r#"
        SELECT
            id,
            rk_id,
            type AS "question_type: QuestionType",
            description,
            answer,
            is_active,
            registered_at
        FROM questions
        WHERE rk_id = $1
        ORDER BY id
        "#,
        rk_id
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(questions))
}

pub async fn create_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload
        .check_answer()
        .map_err(|e| AppError::BadRequest(e.code.to_string()))?;

    let question = sqlx::query_as!(
        Question,
        r#"
        INSERT INTO questions (rk_id, type, description, answer, is_active)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING
            id,
            rk_id,
            type AS "question_type: QuestionType",
            description,
            answer,
            is_active,
            registered_at
        "#,
        payload.rk_id,
        payload.question_type.as_signature(),
        payload.description,
        payload.answer,
        payload.is_active
    )
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            AppError::NotFound("Test not found".to_string())
        } else {
            tracing::error!("Failed to create question: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Edits a question's description or opens/retires it.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = sqlx::query!(
        r#"
        UPDATE questions
        SET description = COALESCE($1, description), is_active = COALESCE($2, is_active)
        WHERE id = $3
        "#,
        payload.description,
        payload.is_active,
        id
    )
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a question nobody has been given yet. Questions that appear in a
/// session keep their recorded answers and can only be retired.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query!("DELETE FROM questions WHERE id = $1", id)
        .execute(&pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::Conflict(
                    "Question has recorded answers; set is_active to false instead".to_string(),
                )
            } else {
                tracing::error!("Failed to delete question: {:?}", e);
                AppError::from(e)
            }
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn multi_right_question(pool: &PgPool, id: i64) -> Result<Question, AppError> {
    let question = questions::find(pool, id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    if question.question_type != QuestionType::MultiRightAnswer {
        return Err(AppError::BadRequest(format!(
            "Question {} is '{}', not '{}'",
            id,
            question.question_type,
            QuestionType::MultiRightAnswer
        )));
    }

    Ok(question)
}

/// Adds a candidate answer to a multi-right-answer question.
pub async fn create_answer(
    State(pool): State<PgPool>,
    Path(question_id): Path<i64>,
    Json(payload): Json<CreateAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let question = multi_right_question(&pool, question_id).await?;

    let id = sqlx::query!(
        r#"
        INSERT INTO answers (question_id, text, display_order_number)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
        question.id,
        payload.text,
        payload.display_order_number
    )
    .fetch_one(&pool)
    .await?
    .id;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Registers one accepted ordering of answer IDs.
pub async fn create_right_answer(
    State(pool): State<PgPool>,
    Path(question_id): Path<i64>,
    Json(payload): Json<CreateRightAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let question = multi_right_question(&pool, question_id).await?;

    let known = sqlx::query!(
        r#"
        SELECT COUNT(DISTINCT id) AS "known!"
        FROM answers
        WHERE question_id = $1 AND id = ANY($2)
        "#,
        question.id,
        &payload.answer_ids[..]
    )
    .fetch_one(&pool)
    .await?
    .known;

    let mut distinct = payload.answer_ids.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if known != distinct.len() as i64 {
        return Err(AppError::BadRequest(
            "Every answer must belong to the question".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let right_answer_id = sqlx::query!(
        "INSERT INTO right_answers (question_id) VALUES ($1) RETURNING id",
        question.id
    )
    .fetch_one(&mut *tx)
    .await?
    .id;

    for (position, answer_id) in payload.answer_ids.iter().copied().enumerate() {
        sqlx::query!(
            r#"
            INSERT INTO answer_to_right_answer (right_answer_id, answer_id, order_number)
            VALUES ($1, $2, $3)
            "#,
            right_answer_id,
            answer_id,
            position as i32 + 1
        )
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": right_answer_id, "answer_ids": payload.answer_ids })),
    ))
}

/// Postgres reports foreign key violations with SQLSTATE 23503.
fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23503"),
        _ => false,
    }
}
