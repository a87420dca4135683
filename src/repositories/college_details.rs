use sqlx::PgPool;

use crate::db::models::CollegeDetails;

const COLUMNS: &str =
    "id, admin_id, logo_url, college_name, college_address, department, updated_at";

/// Branding set by the admin who approved the lecturer with this email.
pub(crate) async fn find_for_lecturer_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<CollegeDetails>, sqlx::Error> {
    sqlx::query_as::<_, CollegeDetails>(
        "SELECT c.id, c.admin_id, c.logo_url, c.college_name, c.college_address, c.department,
                c.updated_at
         FROM approved_lecturers a
         JOIN college_details c ON c.admin_id = a.added_by
         WHERE a.email = $1
         ORDER BY c.updated_at DESC
         LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_department(
    pool: &PgPool,
    department: &str,
) -> Result<Option<CollegeDetails>, sqlx::Error> {
    sqlx::query_as::<_, CollegeDetails>(&format!(
        "SELECT {COLUMNS} FROM college_details
         WHERE department = $1
         ORDER BY updated_at DESC
         LIMIT 1"
    ))
    .bind(department)
    .fetch_optional(pool)
    .await
}
