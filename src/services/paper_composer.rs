//! Incremental paper assembly.
//!
//! Questions are placed greedily: each add goes into the last main question that still has
//! room, or opens a new one when every group is full. Numbering and OR/AND operators are
//! re-derived from position after every structural change.

use crate::db::models::Question;
use crate::schemas::paper::{
    marks_equal, CompositionState, MainQuestion, Operator, PaperShape, SubQuestion,
    MARK_TOLERANCE,
};
use crate::services::paper_errors::CompositionError;

pub(crate) fn add_question(
    state: &CompositionState,
    question: &Question,
    shape: &PaperShape,
) -> Result<CompositionState, CompositionError> {
    ensure_valid_shape(shape)?;

    if !question.marks.is_finite() || question.marks <= 0.0 {
        return Err(CompositionError::InvalidQuestionMarks {
            question_id: question.id.clone(),
            marks: question.marks,
        });
    }

    if state.contains(&question.id) {
        return Err(CompositionError::DuplicateQuestion { question_id: question.id.clone() });
    }

    let per_question = shape.per_question_marks();
    let limit = shape.required_total_marks();
    let current = state.total_marks();
    if current >= limit - MARK_TOLERANCE || current + question.marks > limit + MARK_TOLERANCE {
        return Err(CompositionError::TotalMarksExceeded {
            current,
            attempted: question.marks,
            limit,
        });
    }

    let mut groups = state.main_questions.clone();
    let target_index = match open_group_index(&groups, per_question) {
        Some(index) => index,
        None => {
            groups.push(MainQuestion::empty(groups.len()));
            groups.len() - 1
        }
    };

    let target = &mut groups[target_index];
    let group_marks = target.marks();
    if group_marks + question.marks > per_question + MARK_TOLERANCE {
        return Err(CompositionError::GroupMarksExceeded {
            question_number: target.question_number,
            attempted: question.marks,
            allotted: per_question,
            remaining: (per_question - group_marks).max(0.0),
        });
    }

    let letter = if target.sub_questions.is_empty() && marks_equal(question.marks, per_question) {
        String::new()
    } else {
        letter_for_position(target.sub_questions.len())
    };
    target.sub_questions.push(SubQuestion::from_question(question, letter));

    tracing::debug!(
        question_id = %question.id,
        question_number = target_index + 1,
        marks = question.marks,
        "Question placed"
    );

    Ok(CompositionState { main_questions: renumber(groups) })
}

/// Removes one sub-question and hands back the released question id.
pub(crate) fn remove_sub_question(
    state: &CompositionState,
    main_index: usize,
    sub_index: usize,
) -> Result<(CompositionState, String), CompositionError> {
    let in_range = state
        .main_questions
        .get(main_index)
        .is_some_and(|main| sub_index < main.sub_questions.len());
    if !in_range {
        return Err(CompositionError::IndexOutOfRange { main_index, sub_index });
    }

    let mut groups = state.main_questions.clone();
    let removed = groups[main_index].sub_questions.remove(sub_index);

    if groups[main_index].sub_questions.is_empty() {
        groups.remove(main_index);
    } else {
        for (position, sub) in groups[main_index].sub_questions.iter_mut().enumerate() {
            sub.letter = letter_for_position(position);
        }
    }

    tracing::debug!(question_id = %removed.question_id, main_index, sub_index, "Question released");

    Ok((CompositionState { main_questions: renumber(groups) }, removed.question_id))
}

/// Re-derives `question_number` and `operator` from position.
pub(crate) fn renumber(groups: Vec<MainQuestion>) -> Vec<MainQuestion> {
    groups
        .into_iter()
        .enumerate()
        .map(|(index, main)| MainQuestion {
            question_number: index + 1,
            sub_questions: main.sub_questions,
            operator: Operator::for_index(index),
        })
        .collect()
}

/// `a`..`z`, then `aa`, `ab`, ...
pub(crate) fn letter_for_position(position: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = position + 1;
    while remaining > 0 {
        remaining -= 1;
        letters.push(char::from(b'a' + (remaining % 26) as u8));
        remaining /= 26;
    }
    letters.iter().rev().collect()
}

pub(crate) fn ensure_valid_shape(shape: &PaperShape) -> Result<(), CompositionError> {
    if shape.is_valid() {
        Ok(())
    } else {
        Err(CompositionError::InvalidShape {
            maximum_marks: shape.maximum_marks,
            questions_to_attend: shape.number_of_questions_to_attend,
        })
    }
}

fn open_group_index(groups: &[MainQuestion], per_question: f64) -> Option<usize> {
    groups.iter().rposition(|main| main.marks() < per_question - MARK_TOLERANCE)
}
