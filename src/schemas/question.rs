use serde::{Deserialize, Serialize};
use validator::Validate;

/// A question to add to a lecturer's pool, either typed in or picked from generator output.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "lecturerId")]
    #[validate(length(min = 1, message = "lecturer_id must not be empty"))]
    pub(crate) lecturer_id: String,
    #[serde(alias = "subjectId")]
    #[validate(length(min = 1, message = "subject_id must not be empty"))]
    pub(crate) subject_id: String,
    #[serde(alias = "moduleId")]
    #[validate(length(min = 1, message = "module_id must not be empty"))]
    pub(crate) module_id: String,
    #[validate(length(min = 1, max = 500, message = "topic must be 1..500 characters"))]
    pub(crate) topic: String,
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub(crate) question: String,
    #[validate(range(exclusive_min = 0.0, max = 100.0, message = "marks must be in (0, 100]"))]
    pub(crate) marks: f64,
    #[serde(alias = "courseOutcome")]
    #[validate(length(min = 1, max = 64, message = "course_outcome must be 1..64 characters"))]
    pub(crate) course_outcome: String,
    #[serde(alias = "learningOutcome")]
    #[validate(length(min = 1, max = 64, message = "learning_outcome must be 1..64 characters"))]
    pub(crate) learning_outcome: String,
}
