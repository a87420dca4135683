use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::db::models::Question;
use crate::db::types::AssessmentType;

/// Absolute slack for every marks comparison. Absorbs division artifacts of
/// `maximum_marks / number_of_questions_to_attend`.
pub(crate) const MARK_TOLERANCE: f64 = 0.01;

pub(crate) fn marks_equal(left: f64, right: f64) -> bool {
    (left - right).abs() <= MARK_TOLERANCE
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct PaperShape {
    #[serde(alias = "maximumMarks")]
    pub(crate) maximum_marks: f64,
    #[serde(alias = "numberOfQuestionsToAttend")]
    pub(crate) number_of_questions_to_attend: u32,
}

impl PaperShape {
    pub(crate) fn new(maximum_marks: f64, number_of_questions_to_attend: u32) -> Self {
        Self { maximum_marks, number_of_questions_to_attend }
    }

    /// Marks every main question has to total.
    pub(crate) fn per_question_marks(&self) -> f64 {
        if self.number_of_questions_to_attend == 0 {
            return 0.0;
        }
        self.maximum_marks / f64::from(self.number_of_questions_to_attend)
    }

    /// Students attend N of 2N, so the paper carries double the attendable marks.
    pub(crate) fn required_total_marks(&self) -> f64 {
        self.maximum_marks * 2.0
    }

    pub(crate) fn is_valid(&self) -> bool {
        let per_question = self.per_question_marks();
        per_question.is_finite() && per_question > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum Operator {
    Or,
    And,
}

impl Operator {
    pub(crate) fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            Operator::Or
        } else {
            Operator::And
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Operator::Or => "OR",
            Operator::And => "AND",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SubQuestion {
    #[serde(default)]
    pub(crate) letter: String,
    pub(crate) text: String,
    pub(crate) marks: f64,
    #[serde(default)]
    pub(crate) course_outcome: String,
    #[serde(default)]
    pub(crate) learning_outcome: String,
    pub(crate) question_id: String,
}

impl SubQuestion {
    pub(crate) fn from_question(question: &Question, letter: String) -> Self {
        Self {
            letter,
            text: question.question.clone(),
            marks: question.marks,
            course_outcome: question.course_outcome.clone(),
            learning_outcome: question.learning_outcome.clone(),
            question_id: question.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct MainQuestion {
    pub(crate) question_number: usize,
    pub(crate) sub_questions: Vec<SubQuestion>,
    pub(crate) operator: Operator,
}

impl MainQuestion {
    pub(crate) fn empty(index: usize) -> Self {
        Self {
            question_number: index + 1,
            sub_questions: Vec::new(),
            operator: Operator::for_index(index),
        }
    }

    pub(crate) fn marks(&self) -> f64 {
        self.sub_questions.iter().map(|sub| sub.marks).sum()
    }
}

/// The in-progress paper owned by one authoring session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct CompositionState {
    #[serde(default)]
    pub(crate) main_questions: Vec<MainQuestion>,
}

impl CompositionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.main_questions.is_empty()
    }

    pub(crate) fn total_marks(&self) -> f64 {
        self.main_questions.iter().map(MainQuestion::marks).sum()
    }

    pub(crate) fn sub_questions(&self) -> impl Iterator<Item = &SubQuestion> {
        self.main_questions.iter().flat_map(|main| main.sub_questions.iter())
    }

    pub(crate) fn contains(&self, question_id: &str) -> bool {
        self.sub_questions().any(|sub| sub.question_id == question_id)
    }

    /// Question ids already placed in the paper.
    pub(crate) fn consumed_ids(&self) -> BTreeSet<String> {
        self.sub_questions().map(|sub| sub.question_id.clone()).collect()
    }

    /// Narrows a pool to the questions that can still be added in this session.
    pub(crate) fn addable<'a>(&self, pool: &'a [Question]) -> Vec<&'a Question> {
        let consumed = self.consumed_ids();
        pool.iter()
            .filter(|question| !question.is_used && !consumed.contains(&question.id))
            .collect()
    }
}

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

fn default_template_type() -> String {
    "standard".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub(crate) struct PaperMetadata {
    #[serde(alias = "assessmentType")]
    pub(crate) assessment_type: AssessmentType,
    #[validate(range(min = 1, max = 8, message = "semester must be between 1 and 8"))]
    pub(crate) semester: i32,
    #[serde(alias = "subjectId")]
    #[validate(length(min = 1, message = "subject_id must not be empty"))]
    pub(crate) subject_id: String,
    #[serde(alias = "facultyName")]
    #[validate(length(min = 1, message = "faculty_name must not be empty"))]
    pub(crate) faculty_name: String,
    #[serde(alias = "assessmentDate", with = "iso_date")]
    pub(crate) assessment_date: Date,
    #[serde(alias = "assessmentTime")]
    #[validate(length(min = 1, message = "assessment_time must not be empty"))]
    pub(crate) assessment_time: String,
    #[serde(default, alias = "courseOutcome")]
    pub(crate) course_outcome: String,
    #[serde(default, alias = "learningOutcome")]
    pub(crate) learning_outcome: String,
    #[serde(default = "default_template_type", alias = "templateType")]
    pub(crate) template_type: String,
}
