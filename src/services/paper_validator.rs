use std::collections::HashSet;

use crate::schemas::paper::{marks_equal, CompositionState, MainQuestion, PaperShape};
use crate::services::paper_composer::{ensure_valid_shape, letter_for_position, renumber};
use crate::services::paper_errors::CompositionError;

/// Checks a finished composition and returns it normalized for persistence.
///
/// Checks short-circuit in a fixed order so the author always sees the most fundamental
/// problem first. Validating the returned value again yields an identical value.
pub(crate) fn validate(
    state: &CompositionState,
    shape: &PaperShape,
) -> Result<CompositionState, CompositionError> {
    if state.is_empty() {
        return Err(CompositionError::EmptyComposition);
    }

    ensure_valid_shape(shape)?;

    let required = shape.number_of_questions_to_attend as usize;
    let actual = state.main_questions.len();
    if actual < required {
        return Err(CompositionError::InsufficientQuestions {
            required,
            actual,
            missing: required - actual,
        });
    }

    let per_question = shape.per_question_marks();
    for (index, main) in state.main_questions.iter().enumerate() {
        let marks = main.marks();
        if !marks_equal(marks, per_question) {
            return Err(CompositionError::GroupMarksMismatch {
                question_number: index + 1,
                actual: marks,
                expected: per_question,
            });
        }
    }

    let total = state.total_marks();
    let expected_total = shape.required_total_marks();
    if !marks_equal(total, expected_total) {
        return Err(CompositionError::TotalMarksMismatch { actual: total, expected: expected_total });
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) =
        state.sub_questions().find(|sub| !seen.insert(sub.question_id.as_str()))
    {
        return Err(CompositionError::DuplicateQuestion {
            question_id: duplicate.question_id.clone(),
        });
    }

    let groups = state
        .main_questions
        .iter()
        .cloned()
        .map(|main| reletter(main, per_question))
        .collect();

    Ok(CompositionState { main_questions: renumber(groups) })
}

fn reletter(mut main: MainQuestion, per_question: f64) -> MainQuestion {
    let single_full =
        main.sub_questions.len() == 1 && marks_equal(main.sub_questions[0].marks, per_question);
    for (position, sub) in main.sub_questions.iter_mut().enumerate() {
        sub.letter = if single_full { String::new() } else { letter_for_position(position) };
    }
    main
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::paper::Operator;
    use crate::services::paper_composer::{add_question, remove_sub_question};
    use crate::test_support::question;

    fn compose(shape: &PaperShape, marks: &[f64]) -> CompositionState {
        marks.iter().enumerate().fold(CompositionState::new(), |state, (index, marks)| {
            add_question(&state, &question(&format!("q{index}"), *marks), shape).expect("add")
        })
    }

    #[test]
    fn four_full_groups_pass() {
        let shape = PaperShape::new(10.0, 2);
        let state = compose(&shape, &[5.0, 5.0, 5.0, 5.0]);

        let normalized = validate(&state, &shape).expect("valid");
        assert_eq!(normalized.main_questions.len(), 4);
        let operators: Vec<_> = normalized.main_questions.iter().map(|main| main.operator).collect();
        assert_eq!(operators, vec![Operator::Or, Operator::And, Operator::Or, Operator::And]);
        assert!(normalized.sub_questions().all(|sub| sub.letter.is_empty()));
        assert_eq!(normalized, state);
    }

    #[test]
    fn validation_is_idempotent() {
        let shape = PaperShape::new(10.0, 2);
        let state = compose(&shape, &[3.0, 2.0, 5.0, 2.5, 2.5, 5.0]);

        let once = validate(&state, &shape).expect("first pass");
        let twice = validate(&once, &shape).expect("second pass");
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_composition_is_rejected_before_shape() {
        let err = validate(&CompositionState::new(), &PaperShape::new(10.0, 0)).unwrap_err();
        assert_eq!(err, CompositionError::EmptyComposition);
    }

    #[test]
    fn degenerate_shape_is_rejected() {
        let state = compose(&PaperShape::new(10.0, 2), &[5.0]);
        let err = validate(&state, &PaperShape::new(10.0, 0)).unwrap_err();
        assert_eq!(err.kind(), "invalid_shape");
    }

    #[test]
    fn too_few_groups_fail_before_total_check() {
        let state = compose(&PaperShape::new(10.0, 2), &[5.0, 5.0]);
        let shape = PaperShape::new(10.0, 3);

        let err = validate(&state, &shape).unwrap_err();
        assert_eq!(err, CompositionError::InsufficientQuestions { required: 3, actual: 2, missing: 1 });
    }

    #[test]
    fn first_unbalanced_group_is_reported() {
        let shape = PaperShape::new(10.0, 2);
        let state = compose(&shape, &[5.0, 3.0]);

        let err = validate(&state, &shape).unwrap_err();
        assert_eq!(
            err,
            CompositionError::GroupMarksMismatch { question_number: 2, actual: 3.0, expected: 5.0 }
        );
    }

    #[test]
    fn balanced_groups_still_need_the_doubled_total() {
        let shape = PaperShape::new(10.0, 2);
        let state = compose(&shape, &[5.0, 5.0]);

        let err = validate(&state, &shape).unwrap_err();
        assert_eq!(err, CompositionError::TotalMarksMismatch { actual: 10.0, expected: 20.0 });
    }

    #[test]
    fn fractional_groups_pass_within_tolerance() {
        let shape = PaperShape::new(10.0, 3);
        let state = compose(&shape, &[10.0 / 3.0; 6]);

        let normalized = validate(&state, &shape).expect("valid within tolerance");
        assert_eq!(normalized.main_questions.len(), 6);
        assert!(normalized.sub_questions().all(|sub| sub.letter.is_empty()));
    }

    #[test]
    fn duplicate_ids_from_hand_built_compositions_are_rejected() {
        let shape = PaperShape::new(10.0, 2);
        let mut state = compose(&shape, &[5.0, 5.0, 5.0, 5.0]);
        state.main_questions[3].sub_questions[0].question_id = "q0".to_string();

        let err = validate(&state, &shape).unwrap_err();
        assert_eq!(err, CompositionError::DuplicateQuestion { question_id: "q0".to_string() });
    }

    #[test]
    fn normalization_repairs_stale_numbers_and_letters() {
        let shape = PaperShape::new(10.0, 2);
        let state = compose(&shape, &[3.0, 2.0, 5.0, 5.0, 5.0]);
        let (state, _) = remove_sub_question(&state, 0, 1).expect("remove");
        let state = add_question(&state, &question("late", 2.0), &shape).expect("refill");

        let mut stale = state.clone();
        stale.main_questions.swap(0, 1);
        stale.main_questions[1].sub_questions[0].letter = "x".to_string();

        let normalized = validate(&stale, &shape).expect("valid");
        let numbers: Vec<_> = normalized.main_questions.iter().map(|main| main.question_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        let letters: Vec<_> = normalized.main_questions[1]
            .sub_questions
            .iter()
            .map(|sub| sub.letter.as_str())
            .collect();
        assert_eq!(letters, vec!["a", "b"]);
        assert_eq!(normalized.main_questions[0].sub_questions[0].letter, "");
    }
}
