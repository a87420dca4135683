use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::{AssessmentType, UserRole};
use crate::schemas::paper::MainQuestion;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) department: String,
    pub(crate) is_approved: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Subject {
    pub(crate) id: String,
    pub(crate) subject_name: String,
    pub(crate) subject_code: String,
    pub(crate) semester: i32,
    pub(crate) department: String,
    pub(crate) added_by: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CollegeDetails {
    pub(crate) id: String,
    pub(crate) admin_id: String,
    pub(crate) logo_url: String,
    pub(crate) college_name: String,
    pub(crate) college_address: String,
    pub(crate) department: String,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// A saved question in a lecturer's pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) lecturer_id: String,
    pub(crate) subject_id: String,
    pub(crate) module_id: String,
    pub(crate) topic: String,
    pub(crate) question: String,
    pub(crate) marks: f64,
    pub(crate) course_outcome: String,
    pub(crate) learning_outcome: String,
    pub(crate) is_used: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionPaper {
    pub(crate) id: String,
    pub(crate) lecturer_id: String,
    pub(crate) department: String,
    pub(crate) template_type: String,
    pub(crate) assessment_type: AssessmentType,
    pub(crate) semester: i32,
    pub(crate) subject_id: String,
    pub(crate) subject_name: String,
    pub(crate) subject_code: String,
    pub(crate) faculty_name: String,
    pub(crate) assessment_date: Date,
    pub(crate) assessment_time: String,
    pub(crate) maximum_marks: f64,
    pub(crate) number_of_questions_to_attend: i32,
    pub(crate) course_outcome: String,
    pub(crate) learning_outcome: String,
    pub(crate) questions: Json<Vec<MainQuestion>>,
    pub(crate) document_url: String,
    pub(crate) sent_to_admin: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct UnusedQuestionReport {
    pub(crate) id: String,
    pub(crate) lecturer_id: String,
    pub(crate) file_name: String,
    pub(crate) file_content: String,
    pub(crate) question_paper_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}
