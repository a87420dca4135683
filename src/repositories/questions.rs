use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Question;

pub(crate) const COLUMNS: &str = "\
    id, lecturer_id, subject_id, module_id, topic, question, marks, course_outcome, \
    learning_outcome, is_used, created_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UnusedQuestionRow {
    pub(crate) question: String,
    pub(crate) topic: String,
    pub(crate) marks: f64,
    pub(crate) subject_name: Option<String>,
    pub(crate) module_name: Option<String>,
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) lecturer_id: &'a str,
    pub(crate) subject_id: &'a str,
    pub(crate) module_id: &'a str,
    pub(crate) topic: &'a str,
    pub(crate) question: &'a str,
    pub(crate) marks: f64,
    pub(crate) course_outcome: &'a str,
    pub(crate) learning_outcome: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO generated_questions (
            id, lecturer_id, subject_id, module_id, topic, question, marks, course_outcome,
            learning_outcome, is_used, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,FALSE,$10)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.lecturer_id)
    .bind(params.subject_id)
    .bind(params.module_id)
    .bind(params.topic)
    .bind(params.question)
    .bind(params.marks)
    .bind(params.course_outcome)
    .bind(params.learning_outcome)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

/// Unused questions of one lecturer and subject, newest first.
pub(crate) async fn list_unused(
    pool: &PgPool,
    lecturer_id: &str,
    subject_id: &str,
    marks: Option<f64>,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM generated_questions
         WHERE lecturer_id = $1
           AND subject_id = $2
           AND is_used = FALSE
           AND ($3::DOUBLE PRECISION IS NULL OR ABS(marks - $3) <= 0.01)
         ORDER BY created_at DESC"
    ))
    .bind(lecturer_id)
    .bind(subject_id)
    .bind(marks)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_ids(
    pool: &PgPool,
    lecturer_id: &str,
    subject_id: &str,
    ids: &[String],
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM generated_questions
         WHERE lecturer_id = $1 AND subject_id = $2 AND id = ANY($3)
         ORDER BY array_position($3::TEXT[], id::TEXT)"
    ))
    .bind(lecturer_id)
    .bind(subject_id)
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_unused_by_lecturer(
    executor: impl sqlx::PgExecutor<'_>,
    lecturer_id: &str,
) -> Result<Vec<UnusedQuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, UnusedQuestionRow>(
        "SELECT q.question, q.topic, q.marks,
                s.subject_name AS subject_name,
                m.module_name AS module_name
         FROM generated_questions q
         LEFT JOIN subjects s ON s.id = q.subject_id
         LEFT JOIN modules m ON m.id = q.module_id
         WHERE q.lecturer_id = $1 AND q.is_used = FALSE
         ORDER BY q.created_at ASC",
    )
    .bind(lecturer_id)
    .fetch_all(executor)
    .await
}

/// Flips `is_used` for the given ids and returns how many rows actually changed.
pub(crate) async fn mark_used(
    executor: impl sqlx::PgExecutor<'_>,
    lecturer_id: &str,
    subject_id: &str,
    ids: &[String],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE generated_questions SET is_used = TRUE
         WHERE id = ANY($1) AND lecturer_id = $2 AND subject_id = $3 AND is_used = FALSE",
    )
    .bind(ids)
    .bind(lecturer_id)
    .bind(subject_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Ids among `ids` that are missing, owned by someone else, filed under another subject, or
/// already used.
pub(crate) async fn unavailable_ids(
    executor: impl sqlx::PgExecutor<'_>,
    lecturer_id: &str,
    subject_id: &str,
    ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT wanted.id FROM UNNEST($1::VARCHAR[]) AS wanted(id)
         WHERE NOT EXISTS (
            SELECT 1 FROM generated_questions q
            WHERE q.id = wanted.id AND q.lecturer_id = $2 AND q.subject_id = $3
              AND q.is_used = FALSE
         )
         ORDER BY wanted.id",
    )
    .bind(ids)
    .bind(lecturer_id)
    .bind(subject_id)
    .fetch_all(executor)
    .await
}
