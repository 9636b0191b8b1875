// src/db/sessions.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    exam::timer::{self, TimeLeft},
    models::session::UserSession,
};

/// The user's running session, most recent first if several are marked running.
pub async fn find_running(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<UserSession>, sqlx::Error> {
    sqlx::query_as!(
        UserSession,
        r#"
        SELECT id, user_id, rk_id, attempt, running, registered_at
        FROM user_sessions
        WHERE user_id = $1 AND running = TRUE
        ORDER BY registered_at DESC, id DESC
        LIMIT 1
        "#,
        user_id
    )
    .fetch_optional(pool)
    .await
}

/// Lazily expires the user's running session.
///
/// There is no background timer: a session stays marked running past its
/// deadline until something calls this.
pub async fn refresh(
    pool: &PgPool,
    user_id: i64,
    limit_minutes: i64,
    now: DateTime<Utc>,
) -> Result<TimeLeft, sqlx::Error> {
    let Some(session) = find_running(pool, user_id).await? else {
        return Ok(TimeLeft::NoActiveSession);
    };

    let left = timer::evaluate(session.id, session.registered_at, now, limit_minutes);

    if let TimeLeft::Expired { .. } = left {
        finish(pool, session.id).await?;
        tracing::info!("Session {} of user {} expired", session.id, user_id);
    }

    Ok(left)
}

pub async fn finish(pool: &PgPool, session_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query!("UPDATE user_sessions SET running = FALSE WHERE id = $1", session_id)
        .execute(pool)
        .await?;
    Ok(())
}
