use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::UnusedQuestionReport;

const COLUMNS: &str = "id, lecturer_id, file_name, file_content, question_paper_id, created_at";

pub(crate) struct CreateReport<'a> {
    pub(crate) id: &'a str,
    pub(crate) lecturer_id: &'a str,
    pub(crate) file_name: &'a str,
    pub(crate) file_content: &'a str,
    pub(crate) question_paper_id: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateReport<'_>,
) -> Result<UnusedQuestionReport, sqlx::Error> {
    sqlx::query_as::<_, UnusedQuestionReport>(&format!(
        "INSERT INTO unused_question_reports (
            id, lecturer_id, file_name, file_content, question_paper_id, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.lecturer_id)
    .bind(params.file_name)
    .bind(params.file_content)
    .bind(params.question_paper_id)
    .bind(params.now)
    .fetch_one(pool)
    .await
}
