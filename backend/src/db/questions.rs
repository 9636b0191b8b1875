// src/db/questions.rs

use sqlx::PgPool;

use crate::{
    exam::{QuestionType, grader::Canonical, records::AnswerChoice},
    models::question::Question,
};

pub async fn find(pool: &PgPool, question_id: i64) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as!(
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
        WHERE id = $1
        "#,
        question_id
    )
    .fetch_optional(pool)
    .await
}

/// Candidate answers in display order.
pub async fn choices(pool: &PgPool, question_id: i64) -> Result<Vec<AnswerChoice>, sqlx::Error> {
    sqlx::query_as!(
        AnswerChoice,
        r#"
        SELECT id, text
        FROM answers
        WHERE question_id = $1
        ORDER BY display_order_number, id
        "#,
        question_id
    )
    .fetch_all(pool)
    .await
}

/// Every registered right answer as an ordered sequence of answer IDs.
pub async fn right_sequences(
    pool: &PgPool,
    question_id: i64,
) -> Result<Vec<Vec<i64>>, sqlx::Error> {
    let links = sqlx::query!(
        r#"
        SELECT ra.id AS right_answer_id, atra.answer_id
        FROM right_answers ra
        JOIN answer_to_right_answer atra ON atra.right_answer_id = ra.id
        WHERE ra.question_id = $1
        ORDER BY ra.id, atra.order_number, atra.id
        "#,
        question_id
    )
    .fetch_all(pool)
    .await?;

    let pairs = links.into_iter().map(|r| (r.right_answer_id, r.answer_id));
    Ok(group_sequences(pairs))
}

/// Groups `(right_answer_id, answer_id)` rows, already ordered, into sequences.
fn group_sequences(links: impl IntoIterator<Item = (i64, i64)>) -> Vec<Vec<i64>> {
    let mut sequences: Vec<Vec<i64>> = Vec::new();
    let mut current: Option<i64> = None;

    for (right_answer_id, answer_id) in links {
        match sequences.last_mut() {
            Some(seq) if current == Some(right_answer_id) => seq.push(answer_id),
            _ => {
                sequences.push(vec![answer_id]);
                current = Some(right_answer_id);
            }
        }
    }

    sequences
}

/// Loads everything needed to grade or display `question`.
pub async fn canonical(pool: &PgPool, question: &Question) -> Result<Canonical, sqlx::Error> {
    let (choices, right) = match question.question_type {
        QuestionType::MultiRightAnswer => (
            choices(pool, question.id).await?,
            right_sequences(pool, question.id).await?,
        ),
        _ => (Vec::new(), Vec::new()),
    };

    Ok(Canonical::from_answer(
        question.question_type,
        &question.answer,
        choices,
        right,
    ))
}
