use thiserror::Error;

/// Local validation failures of the composer and validator. None of them is fatal: the
/// composition a failing operation was given is left untouched so the author can retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum CompositionError {
    #[error(
        "invalid paper shape: maximum marks {maximum_marks} over {questions_to_attend} question(s) \
         to attend gives no positive per-question marks"
    )]
    InvalidShape { maximum_marks: f64, questions_to_attend: u32 },
    #[error("question {question_id} has invalid marks {marks}; marks must be positive")]
    InvalidQuestionMarks { question_id: String, marks: f64 },
    #[error("question {question_id} is already part of this paper")]
    DuplicateQuestion { question_id: String },
    #[error(
        "adding {attempted} marks would exceed the total marks limit ({limit}); \
         the paper currently totals {current}"
    )]
    TotalMarksExceeded { current: f64, attempted: f64, limit: f64 },
    #[error(
        "adding {attempted} marks would exceed the allotted {allotted} marks for question \
         {question_number}; only {remaining} mark(s) remain"
    )]
    GroupMarksExceeded { question_number: usize, attempted: f64, allotted: f64, remaining: f64 },
    #[error("no sub-question at position {main_index}/{sub_index}")]
    IndexOutOfRange { main_index: usize, sub_index: usize },
    #[error("add at least one question before submitting the paper")]
    EmptyComposition,
    #[error(
        "add at least {required} main questions so students can attend the required number; \
         {missing} more needed"
    )]
    InsufficientQuestions { required: usize, actual: usize, missing: usize },
    #[error(
        "question {question_number} totals {actual} marks; each main question must total {expected}"
    )]
    GroupMarksMismatch { question_number: usize, actual: f64, expected: f64 },
    #[error("total marks ({actual}) must equal {expected} (maximum marks x 2)")]
    TotalMarksMismatch { actual: f64, expected: f64 },
}

impl CompositionError {
    /// Stable label for logs and metrics.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CompositionError::InvalidShape { .. } => "invalid_shape",
            CompositionError::InvalidQuestionMarks { .. } => "invalid_question_marks",
            CompositionError::DuplicateQuestion { .. } => "duplicate_question",
            CompositionError::TotalMarksExceeded { .. } => "total_marks_exceeded",
            CompositionError::GroupMarksExceeded { .. } => "group_marks_exceeded",
            CompositionError::IndexOutOfRange { .. } => "index_out_of_range",
            CompositionError::EmptyComposition => "empty_composition",
            CompositionError::InsufficientQuestions { .. } => "insufficient_questions",
            CompositionError::GroupMarksMismatch { .. } => "group_marks_mismatch",
            CompositionError::TotalMarksMismatch { .. } => "total_marks_mismatch",
        }
    }
}
