// src/handlers/rk.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::PgPool;

use crate::{
    config::Config,
    db::sessions,
    error::AppError,
    models::{
        attempt::Attempt,
        rk::{Rk, RkListItem, RkView},
        session::UserSession,
    },
    utils::jwt::Claims,
};

/// Lists open tests together with the caller's attempt counters.
pub async fn list_rks(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let rks = sqlx::query_as!(
        RkListItem,
        r#"
        SELECT
            r.id,
            r.title,
            r.description,
            COALESCE(a.used, 0::SMALLINT) AS "used!",
            COALESCE(a.have, $2::SMALLINT) AS "have!"
        FROM rks r
        LEFT JOIN attempts a ON a.rk_id = r.id AND a.user_id = $1
        WHERE r.is_active = TRUE
        ORDER BY r.id
        "#,
        user_id,
        config.attempts_max
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list tests: {:?}", e);
        AppError::from(e)
    })?;

    let views: Vec<RkView> = rks.into_iter().map(RkListItem::with_html).collect();

    Ok(Json(views))
}

/// Starts a new attempt at a test.
///
/// * Refuses while another session of the user is still running.
/// * Spends one attempt (`used + 1`, `have - 1`), creating the counter on first use.
/// * Copies every active question of the test into the new session.
pub async fn start_session(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(rk_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let left = sessions::refresh(&pool, user_id, config.time_for_attempt, Utc::now()).await?;
    if left.is_running() {
        return Err(AppError::Conflict("A session is already running".to_string()));
    }

    let rk = sqlx::query_as!(
        Rk,
        "SELECT id, title, description, is_active, registered_at FROM rks WHERE id = $1",
        rk_id
    )
    .fetch_optional(&pool)
    .await?
    .filter(|rk| rk.is_active)
    .ok_or(AppError::NotFound("Test not found".to_string()))?;

    let mut tx = pool.begin().await?;

    sqlx::query!(
        r#"
        INSERT INTO attempts (user_id, rk_id, have)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, rk_id) DO NOTHING
        "#,
        user_id,
        rk.id,
        config.attempts_max
    )
    .execute(&mut *tx)
    .await?;

    let attempt = sqlx::query_as!(
        Attempt,
        r#"
        SELECT id, user_id, rk_id, used, have
        FROM attempts
        WHERE user_id = $1 AND rk_id = $2
        FOR UPDATE
        "#,
        user_id,
        rk.id
    )
    .fetch_one(&mut *tx)
    .await?;

    if !attempt.can_start() {
        return Err(AppError::Conflict("No attempts left".to_string()));
    }

    let used = sqlx::query!(
        "UPDATE attempts SET used = used + 1, have = have - 1 WHERE id = $1 RETURNING used",
        attempt.id
    )
    .fetch_one(&mut *tx)
    .await?
    .used;

    let session = sqlx::query_as!(
        UserSession,
        r#"
        INSERT INTO user_sessions (user_id, rk_id, attempt)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, rk_id, attempt, running, registered_at
        "#,
        user_id,
        rk.id,
        used
    )
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query!(
        r#"
        INSERT INTO session_questions (session_id, question_id)
        SELECT $1::BIGINT, id FROM questions
        WHERE rk_id = $2 AND is_active = TRUE
        ORDER BY id
        "#,
        session.id,
        rk.id
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "User {} started '{}' (attempt {}, session {})",
        user_id,
        rk.title,
        session.attempt,
        session.id
    );

    Ok((StatusCode::CREATED, Json(session)))
}
