use time::{Date, Month, PrimitiveDateTime, Time};

use crate::db::models::{Question, QuestionPaper};
use crate::db::types::AssessmentType;
use crate::schemas::paper::{CompositionState, PaperMetadata};

pub(crate) const TEST_LECTURER_ID: &str = "lecturer-1";
pub(crate) const TEST_SUBJECT_ID: &str = "subject-1";

pub(crate) fn fixed_timestamp() -> PrimitiveDateTime {
    let date = Date::from_calendar_date(2025, Month::March, 7).expect("date");
    PrimitiveDateTime::new(date, Time::from_hms(9, 30, 0).expect("time"))
}

/// An unused pool question owned by the test lecturer.
pub(crate) fn question(id: &str, marks: f64) -> Question {
    Question {
        id: id.to_string(),
        lecturer_id: TEST_LECTURER_ID.to_string(),
        subject_id: TEST_SUBJECT_ID.to_string(),
        module_id: "module-1".to_string(),
        topic: "Data structures".to_string(),
        question: format!("Explain concept {id}."),
        marks,
        course_outcome: "CO1".to_string(),
        learning_outcome: "L2".to_string(),
        is_used: false,
        created_at: fixed_timestamp(),
    }
}

pub(crate) fn metadata() -> PaperMetadata {
    PaperMetadata {
        assessment_type: AssessmentType::FirstInternal,
        semester: 3,
        subject_id: TEST_SUBJECT_ID.to_string(),
        faculty_name: "Dr. Rao".to_string(),
        assessment_date: fixed_timestamp().date(),
        assessment_time: "90".to_string(),
        course_outcome: String::new(),
        learning_outcome: String::new(),
        template_type: "standard".to_string(),
    }
}

pub(crate) fn paper_record(composition: CompositionState) -> QuestionPaper {
    let meta = metadata();
    QuestionPaper {
        id: "paper-1".to_string(),
        lecturer_id: TEST_LECTURER_ID.to_string(),
        department: "Computer Science".to_string(),
        template_type: meta.template_type,
        assessment_type: meta.assessment_type,
        semester: meta.semester,
        subject_id: meta.subject_id,
        subject_name: "Data Structures".to_string(),
        subject_code: "CS301".to_string(),
        faculty_name: meta.faculty_name,
        assessment_date: meta.assessment_date,
        assessment_time: meta.assessment_time,
        maximum_marks: 10.0,
        number_of_questions_to_attend: 2,
        course_outcome: meta.course_outcome,
        learning_outcome: meta.learning_outcome,
        questions: sqlx::types::Json(composition.main_questions),
        document_url: String::new(),
        sent_to_admin: false,
        created_at: fixed_timestamp(),
        updated_at: fixed_timestamp(),
    }
}
