//! Replays a recorded authoring session against the question pool.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::core::metrics::COMPOSER_REJECTIONS;
use crate::db::models::Question;
use crate::schemas::paper::{CompositionState, PaperMetadata, PaperShape};
use crate::services::paper_composer::{add_question, remove_sub_question};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Draft {
    #[serde(alias = "lecturerId")]
    pub(crate) lecturer_id: String,
    pub(crate) metadata: PaperMetadata,
    pub(crate) shape: PaperShape,
    #[serde(default)]
    pub(crate) steps: Vec<DraftStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DraftStep {
    Add(String),
    Remove { main_index: usize, sub_index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rejection {
    pub(crate) step: usize,
    pub(crate) kind: &'static str,
    pub(crate) message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReplayOutcome {
    pub(crate) state: CompositionState,
    pub(crate) rejections: Vec<Rejection>,
}

pub(crate) async fn load_draft(path: &Path) -> Result<Draft> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read draft {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse draft {}", path.display()))
}

/// Unused pool questions of the draft's author and subject referenced by any `add` step.
pub(crate) async fn load_draft_questions(
    pool: &PgPool,
    draft: &Draft,
) -> Result<HashMap<String, Question>> {
    let mut ids: Vec<String> = draft
        .steps
        .iter()
        .filter_map(|step| match step {
            DraftStep::Add(id) => Some(id.clone()),
            DraftStep::Remove { .. } => None,
        })
        .collect();
    ids.sort();
    ids.dedup();

    let questions = crate::repositories::questions::find_by_ids(
        pool,
        &draft.lecturer_id,
        &draft.metadata.subject_id,
        &ids,
    )
    .await
    .context("Failed to load draft questions")?;

    Ok(eligible_questions(draft, questions))
}

/// Keeps the unused questions that belong to the draft's author and subject, keyed by id.
pub(crate) fn eligible_questions(
    draft: &Draft,
    questions: Vec<Question>,
) -> HashMap<String, Question> {
    questions
        .into_iter()
        .filter(|question| {
            !question.is_used
                && question.lecturer_id == draft.lecturer_id
                && question.subject_id == draft.metadata.subject_id
        })
        .map(|question| (question.id.clone(), question))
        .collect()
}

/// Applies every step in order. A rejected step leaves the composition as it was and the
/// replay continues with the next one.
pub(crate) fn replay_steps(
    shape: &PaperShape,
    steps: &[DraftStep],
    questions: &HashMap<String, Question>,
) -> ReplayOutcome {
    let mut state = CompositionState::new();
    let mut rejections = Vec::new();

    for (step, action) in steps.iter().enumerate() {
        let applied: Result<CompositionState, StepError> = match action {
            DraftStep::Add(id) => match questions.get(id) {
                Some(question) => add_question(&state, question, shape).map_err(Into::into),
                None => Err(StepError::UnknownQuestion(id.clone())),
            },
            DraftStep::Remove { main_index, sub_index } => {
                remove_sub_question(&state, *main_index, *sub_index)
                    .map(|(next, _released)| next)
                    .map_err(Into::into)
            }
        };

        match applied {
            Ok(next) => state = next,
            Err(err) => {
                let rejection = Rejection { step, kind: err.kind(), message: err.to_string() };
                metrics::counter!(COMPOSER_REJECTIONS, "kind" => rejection.kind).increment(1);
                tracing::warn!(
                    step,
                    kind = rejection.kind,
                    "Draft step rejected: {}",
                    rejection.message
                );
                rejections.push(rejection);
            }
        }
    }

    ReplayOutcome { state, rejections }
}

#[derive(Debug, thiserror::Error)]
enum StepError {
    #[error(transparent)]
    Composition(#[from] crate::services::paper_errors::CompositionError),
    #[error("question {0} is not an unused question of this lecturer and subject")]
    UnknownQuestion(String),
}

impl StepError {
    fn kind(&self) -> &'static str {
        match self {
            StepError::Composition(err) => err.kind(),
            StepError::UnknownQuestion(_) => "unknown_question",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{metadata, question, TEST_LECTURER_ID};

    fn pool(entries: &[(&str, f64)]) -> HashMap<String, Question> {
        entries.iter().map(|(id, marks)| (id.to_string(), question(id, *marks))).collect()
    }

    #[test]
    fn steps_deserialize_from_tagged_objects() {
        let steps: Vec<DraftStep> = serde_json::from_str(
            r#"[{"add": "q1"}, {"remove": {"main_index": 0, "sub_index": 1}}]"#,
        )
        .expect("steps");
        assert_eq!(
            steps,
            vec![
                DraftStep::Add("q1".to_string()),
                DraftStep::Remove { main_index: 0, sub_index: 1 }
            ]
        );
    }

    #[test]
    fn draft_accepts_camel_case_metadata() {
        let draft: Draft = serde_json::from_str(
            r#"{
                "lecturerId": "lecturer-1",
                "metadata": {
                    "assessmentType": "Final",
                    "semester": 5,
                    "subjectId": "subject-1",
                    "facultyName": "Dr. Rao",
                    "assessmentDate": "2025-03-07",
                    "assessmentTime": "180"
                },
                "shape": {"maximumMarks": 50, "numberOfQuestionsToAttend": 5},
                "steps": [{"add": "q1"}]
            }"#,
        )
        .expect("draft");
        assert_eq!(draft.shape, PaperShape::new(50.0, 5));
        assert_eq!(draft.metadata.template_type, "standard");
        assert_eq!(draft.steps.len(), 1);
    }

    #[test]
    fn replay_builds_the_composition_in_order() {
        let questions = pool(&[("q1", 3.0), ("q2", 2.0), ("q3", 5.0)]);
        let steps = vec![
            DraftStep::Add("q1".to_string()),
            DraftStep::Add("q2".to_string()),
            DraftStep::Add("q3".to_string()),
        ];

        let outcome = replay_steps(&PaperShape::new(10.0, 2), &steps, &questions);
        assert!(outcome.rejections.is_empty());
        assert_eq!(outcome.state.main_questions.len(), 2);
        assert_eq!(outcome.state.total_marks(), 10.0);
    }

    #[test]
    fn rejected_steps_are_reported_and_skipped() {
        let questions = pool(&[("q1", 3.0), ("q2", 5.0), ("q3", 2.0)]);
        let steps = vec![
            DraftStep::Add("q1".to_string()),
            DraftStep::Add("q2".to_string()),
            DraftStep::Add("missing".to_string()),
            DraftStep::Remove { main_index: 4, sub_index: 0 },
            DraftStep::Add("q3".to_string()),
            DraftStep::Add("q1".to_string()),
        ];

        let outcome = replay_steps(&PaperShape::new(10.0, 2), &steps, &questions);
        let kinds: Vec<_> = outcome.rejections.iter().map(|r| (r.step, r.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (1, "group_marks_exceeded"),
                (2, "unknown_question"),
                (3, "index_out_of_range"),
                (5, "duplicate_question")
            ]
        );
        assert_eq!(outcome.state.consumed_ids().len(), 2);
        assert_eq!(outcome.state.total_marks(), 5.0);
    }

    #[test]
    fn questions_from_another_subject_are_rejected_as_unknown() {
        let draft = Draft {
            lecturer_id: TEST_LECTURER_ID.to_string(),
            metadata: metadata(),
            shape: PaperShape::new(10.0, 2),
            steps: vec![DraftStep::Add("foreign".to_string()), DraftStep::Add("q1".to_string())],
        };
        let foreign =
            Question { subject_id: "subject-other".to_string(), ..question("foreign", 5.0) };
        let other_lecturer =
            Question { lecturer_id: "lecturer-2".to_string(), ..question("borrowed", 5.0) };
        let used = Question { is_used: true, ..question("spent", 5.0) };

        let questions =
            eligible_questions(&draft, vec![foreign, other_lecturer, used, question("q1", 5.0)]);
        assert_eq!(questions.len(), 1);
        assert!(questions.contains_key("q1"));

        let outcome = replay_steps(&draft.shape, &draft.steps, &questions);
        assert!(!outcome.state.contains("foreign"));
        assert!(outcome.state.contains("q1"));
        let kinds: Vec<_> = outcome.rejections.iter().map(|r| (r.step, r.kind)).collect();
        assert_eq!(kinds, vec![(0, "unknown_question")]);
    }

    #[test]
    fn remove_step_releases_a_question_for_re_adding() {
        let questions = pool(&[("q1", 5.0)]);
        let steps = vec![
            DraftStep::Add("q1".to_string()),
            DraftStep::Remove { main_index: 0, sub_index: 0 },
            DraftStep::Add("q1".to_string()),
        ];

        let outcome = replay_steps(&PaperShape::new(10.0, 2), &steps, &questions);
        assert!(outcome.rejections.is_empty());
        assert_eq!(outcome.state.main_questions.len(), 1);
        assert_eq!(outcome.state.main_questions[0].sub_questions[0].letter, "");
    }
}
