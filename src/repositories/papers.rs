use sqlx::types::Json;
use sqlx::PgPool;
use time::{Date, PrimitiveDateTime};

use crate::db::models::QuestionPaper;
use crate::db::types::AssessmentType;
use crate::schemas::paper::MainQuestion;

const COLUMNS: &str = "\
    id, lecturer_id, department, template_type, assessment_type, semester, subject_id, \
    subject_name, subject_code, faculty_name, assessment_date, assessment_time, maximum_marks, \
    number_of_questions_to_attend, course_outcome, learning_outcome, questions, document_url, \
    sent_to_admin, created_at, updated_at";

pub(crate) struct CreatePaper<'a> {
    pub(crate) id: &'a str,
    pub(crate) lecturer_id: &'a str,
    pub(crate) department: &'a str,
    pub(crate) template_type: &'a str,
    pub(crate) assessment_type: AssessmentType,
    pub(crate) semester: i32,
    pub(crate) subject_id: &'a str,
    pub(crate) subject_name: &'a str,
    pub(crate) subject_code: &'a str,
    pub(crate) faculty_name: &'a str,
    pub(crate) assessment_date: Date,
    pub(crate) assessment_time: &'a str,
    pub(crate) maximum_marks: f64,
    pub(crate) number_of_questions_to_attend: i32,
    pub(crate) course_outcome: &'a str,
    pub(crate) learning_outcome: &'a str,
    pub(crate) questions: &'a [MainQuestion],
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreatePaper<'_>,
) -> Result<QuestionPaper, sqlx::Error> {
    sqlx::query_as::<_, QuestionPaper>(&format!(
        "INSERT INTO question_papers (
            id, lecturer_id, department, template_type, assessment_type, semester, subject_id,
            subject_name, subject_code, faculty_name, assessment_date, assessment_time,
            maximum_marks, number_of_questions_to_attend, course_outcome, learning_outcome,
            questions, document_url, sent_to_admin, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,'',FALSE,$18,$19)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.lecturer_id)
    .bind(params.department)
    .bind(params.template_type)
    .bind(params.assessment_type)
    .bind(params.semester)
    .bind(params.subject_id)
    .bind(params.subject_name)
    .bind(params.subject_code)
    .bind(params.faculty_name)
    .bind(params.assessment_date)
    .bind(params.assessment_time)
    .bind(params.maximum_marks)
    .bind(params.number_of_questions_to_attend)
    .bind(params.course_outcome)
    .bind(params.learning_outcome)
    .bind(Json(params.questions))
    .bind(params.now)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn set_document_url(
    pool: &PgPool,
    id: &str,
    document_url: &str,
    now: PrimitiveDateTime,
) -> Result<QuestionPaper, sqlx::Error> {
    sqlx::query_as::<_, QuestionPaper>(&format!(
        "UPDATE question_papers SET document_url = $2, updated_at = $3
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(document_url)
    .bind(now)
    .fetch_one(pool)
    .await
}
