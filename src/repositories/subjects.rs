use sqlx::PgPool;

use crate::db::models::Subject;

const COLUMNS: &str = "id, subject_name, subject_code, semester, department, added_by, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn module_belongs_to_subject(
    pool: &PgPool,
    module_id: &str,
    subject_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM modules WHERE id = $1 AND subject_id = $2)",
    )
    .bind(module_id)
    .bind(subject_id)
    .fetch_one(pool)
    .await
}
