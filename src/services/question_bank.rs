use anyhow::{anyhow, Context, Result};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::core::time::primitive_now_utc;
use crate::db::models::Question;
use crate::schemas::paper::CompositionState;
use crate::schemas::question::QuestionCreate;

/// Pool questions the author can still place: unused in storage and not yet in this session.
pub(crate) async fn list_addable_questions(
    pool: &PgPool,
    lecturer_id: &str,
    subject_id: &str,
    marks: Option<f64>,
    state: &CompositionState,
) -> Result<Vec<Question>> {
    let stored = crate::repositories::questions::list_unused(pool, lecturer_id, subject_id, marks)
        .await
        .context("Failed to list unused questions")?;

    Ok(state.addable(&stored).into_iter().cloned().collect())
}

pub(crate) async fn save_question(pool: &PgPool, payload: QuestionCreate) -> Result<Question> {
    let payload = normalize(payload);
    payload.validate().context("Invalid question")?;
    validate_bloom_level(&payload.learning_outcome)?;

    let known_module = crate::repositories::subjects::module_belongs_to_subject(
        pool,
        &payload.module_id,
        &payload.subject_id,
    )
    .await
    .context("Failed to check module")?;
    if !known_module {
        return Err(anyhow!(
            "Module {} does not belong to subject {}",
            payload.module_id,
            payload.subject_id
        ));
    }

    let id = Uuid::new_v4().to_string();
    let question = crate::repositories::questions::create(
        pool,
        crate::repositories::questions::CreateQuestion {
            id: &id,
            lecturer_id: &payload.lecturer_id,
            subject_id: &payload.subject_id,
            module_id: &payload.module_id,
            topic: &payload.topic,
            question: &payload.question,
            marks: payload.marks,
            course_outcome: &payload.course_outcome,
            learning_outcome: &payload.learning_outcome,
            now: primitive_now_utc(),
        },
    )
    .await
    .context("Failed to save question")?;

    tracing::info!(question_id = %question.id, marks = question.marks, "Question saved to pool");
    Ok(question)
}

fn normalize(mut payload: QuestionCreate) -> QuestionCreate {
    payload.topic = payload.topic.trim().to_string();
    payload.question = payload.question.trim().to_string();
    payload.course_outcome = payload.course_outcome.trim().to_string();
    payload.learning_outcome = payload.learning_outcome.trim().to_ascii_uppercase();
    payload
}

/// Bloom levels are written `L1` to `L6`.
pub(crate) fn validate_bloom_level(level: &str) -> Result<()> {
    let valid = matches!(level.as_bytes(), [b'L', digit] if (b'1'..=b'6').contains(digit));
    if valid {
        Ok(())
    } else {
        Err(anyhow!("Invalid Bloom level '{level}'; expected L1..L6"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> QuestionCreate {
        QuestionCreate {
            lecturer_id: "lecturer-1".to_string(),
            subject_id: "subject-1".to_string(),
            module_id: "module-1".to_string(),
            topic: "  Graphs ".to_string(),
            question: " Explain Dijkstra's algorithm.\n".to_string(),
            marks: 5.0,
            course_outcome: "CO3 ".to_string(),
            learning_outcome: "l3".to_string(),
        }
    }

    #[test]
    fn normalize_trims_text_and_uppercases_level() {
        let normalized = normalize(payload());
        assert_eq!(normalized.topic, "Graphs");
        assert_eq!(normalized.question, "Explain Dijkstra's algorithm.");
        assert_eq!(normalized.course_outcome, "CO3");
        assert_eq!(normalized.learning_outcome, "L3");
        assert!(normalized.validate().is_ok());
    }

    #[test]
    fn blank_question_fails_validation_after_trim() {
        let mut raw = payload();
        raw.question = "   ".to_string();
        assert!(normalize(raw).validate().is_err());
    }

    #[test]
    fn non_positive_marks_fail_validation() {
        let mut raw = payload();
        raw.marks = 0.0;
        assert!(raw.validate().is_err());
    }

    #[test]
    fn bloom_levels_are_l1_to_l6() {
        assert!(validate_bloom_level("L1").is_ok());
        assert!(validate_bloom_level("L6").is_ok());
        assert!(validate_bloom_level("L7").is_err());
        assert!(validate_bloom_level("L").is_err());
        assert!(validate_bloom_level("K2").is_err());
    }
}
