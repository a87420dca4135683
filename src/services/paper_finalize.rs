use std::path::PathBuf;

use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::core::metrics::PAPERS_FINALIZED;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, unix_millis};
use crate::db::models::{CollegeDetails, QuestionPaper, UnusedQuestionReport, User};
use crate::schemas::paper::{CompositionState, PaperMetadata, PaperShape};
use crate::services::paper_document::{build_document, write_document, DocumentRenderer};
use crate::services::paper_errors::CompositionError;
use crate::services::paper_validator::validate;

#[derive(Debug, Error)]
pub(crate) enum FinalizeError {
    #[error(transparent)]
    Composition(#[from] CompositionError),
    #[error("invalid paper details: {0}")]
    InvalidMetadata(String),
    #[error("subject {0} not found")]
    SubjectNotFound(String),
    #[error("questions are no longer available: {}", ids.join(", "))]
    QuestionsUnavailable { ids: Vec<String> },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("document export failed: {0:#}")]
    Export(anyhow::Error),
}

#[derive(Debug)]
pub(crate) struct FinalizeResult {
    pub(crate) paper: QuestionPaper,
    pub(crate) document_path: PathBuf,
    pub(crate) leftover_report: Option<UnusedQuestionReport>,
}

/// Persists a paper and consumes its questions as one unit, then exports it.
///
/// The paper row and the `is_used` flips commit together or not at all. Export happens after
/// commit; the leftover report is informational and never fails the call.
pub(crate) async fn finalize_paper(
    state: &AppState,
    lecturer: &User,
    composition: &CompositionState,
    shape: &PaperShape,
    metadata: &PaperMetadata,
    renderer: &dyn DocumentRenderer,
) -> Result<FinalizeResult, FinalizeError> {
    let normalized = validate(composition, shape)?;
    let questions_to_attend = stored_attend_count(shape)?;
    metadata.validate().map_err(|e| FinalizeError::InvalidMetadata(e.to_string()))?;

    let subject = crate::repositories::subjects::find_by_id(state.db(), &metadata.subject_id)
        .await?
        .ok_or_else(|| FinalizeError::SubjectNotFound(metadata.subject_id.clone()))?;

    let paper_id = Uuid::new_v4().to_string();
    let consumed: Vec<String> = normalized.consumed_ids().into_iter().collect();
    let now = primitive_now_utc();

    let mut tx = state.db().begin().await?;
    let paper = crate::repositories::papers::create(
        &mut *tx,
        crate::repositories::papers::CreatePaper {
            id: &paper_id,
            lecturer_id: &lecturer.id,
            department: &lecturer.department,
            template_type: &metadata.template_type,
            assessment_type: metadata.assessment_type,
            semester: metadata.semester,
            subject_id: &subject.id,
            subject_name: &subject.subject_name,
            subject_code: &subject.subject_code,
            faculty_name: &metadata.faculty_name,
            assessment_date: metadata.assessment_date,
            assessment_time: &metadata.assessment_time,
            maximum_marks: shape.maximum_marks,
            number_of_questions_to_attend: questions_to_attend,
            course_outcome: &metadata.course_outcome,
            learning_outcome: &metadata.learning_outcome,
            questions: &normalized.main_questions,
            now,
        },
    )
    .await?;

    let marked =
        crate::repositories::questions::mark_used(&mut *tx, &lecturer.id, &subject.id, &consumed)
            .await?;
    if marked != consumed.len() as u64 {
        let ids = crate::repositories::questions::unavailable_ids(
            &mut *tx,
            &lecturer.id,
            &subject.id,
            &consumed,
        )
        .await?;
        let _ = tx.rollback().await;
        tracing::warn!(
            lecturer_id = %lecturer.id,
            requested = consumed.len(),
            marked,
            "Paper rejected: questions already used, not owned or off-subject"
        );
        return Err(FinalizeError::QuestionsUnavailable { ids });
    }
    tx.commit().await?;

    metrics::counter!(PAPERS_FINALIZED).increment(1);
    tracing::info!(
        paper_id = %paper.id,
        lecturer_id = %lecturer.id,
        questions = consumed.len(),
        "Question paper finalized"
    );

    let (paper, document_path) = export_document(state, lecturer, paper, renderer)
        .await
        .map_err(FinalizeError::Export)?;

    let leftover_report = match crate::services::leftover_report::create_report(
        state.db(),
        &lecturer.id,
        &paper.id,
        primitive_now_utc(),
    )
    .await
    {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(paper_id = %paper.id, error = %err, "Failed to create leftover report");
            None
        }
    };

    Ok(FinalizeResult { paper, document_path, leftover_report })
}

/// The attend count as stored in the `INTEGER` column.
fn stored_attend_count(shape: &PaperShape) -> Result<i32, CompositionError> {
    i32::try_from(shape.number_of_questions_to_attend).map_err(|_| {
        CompositionError::InvalidShape {
            maximum_marks: shape.maximum_marks,
            questions_to_attend: shape.number_of_questions_to_attend,
        }
    })
}

async fn export_document(
    state: &AppState,
    lecturer: &User,
    paper: QuestionPaper,
    renderer: &dyn DocumentRenderer,
) -> anyhow::Result<(QuestionPaper, PathBuf)> {
    let college = find_branding(state, lecturer, &paper).await?;
    let document = build_document(&paper, college.as_ref());

    let file_stem = format!("paper-{}-{}", paper.id, unix_millis(primitive_now_utc()));
    let output_dir = &state.settings().paper().output_dir;
    let path = write_document(renderer, &document, output_dir, &file_stem).await?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("Document path has no file name")?;
    let url = format!(
        "{}/{}",
        state.settings().paper().document_url_prefix.trim_end_matches('/'),
        file_name
    );
    let paper = crate::repositories::papers::set_document_url(
        state.db(),
        &paper.id,
        &url,
        primitive_now_utc(),
    )
    .await
    .context("Failed to store document url")?;

    tracing::info!(paper_id = %paper.id, document_url = %url, "Paper document exported");
    Ok((paper, path))
}

/// College details of the approving admin, else any matching the paper's department.
async fn find_branding(
    state: &AppState,
    lecturer: &User,
    paper: &QuestionPaper,
) -> anyhow::Result<Option<CollegeDetails>> {
    let by_admin =
        crate::repositories::college_details::find_for_lecturer_email(state.db(), &lecturer.email)
            .await
            .context("Failed to load college details")?;
    if by_admin.is_some() {
        return Ok(by_admin);
    }

    crate::repositories::college_details::find_by_department(state.db(), &paper.department)
        .await
        .context("Failed to load department college details")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_errors_pass_through_unchanged() {
        let err: FinalizeError = CompositionError::EmptyComposition.into();
        assert_eq!(err.to_string(), CompositionError::EmptyComposition.to_string());
        assert!(matches!(err, FinalizeError::Composition(CompositionError::EmptyComposition)));
    }

    #[test]
    fn attend_counts_beyond_the_column_range_are_invalid_shapes() {
        assert_eq!(stored_attend_count(&PaperShape::new(10.0, 2)), Ok(2));
        assert_eq!(stored_attend_count(&PaperShape::new(10.0, i32::MAX as u32)), Ok(i32::MAX));

        let oversized = PaperShape::new(10.0, u32::MAX);
        let err: FinalizeError = stored_attend_count(&oversized).unwrap_err().into();
        assert!(matches!(
            err,
            FinalizeError::Composition(CompositionError::InvalidShape {
                questions_to_attend: u32::MAX,
                ..
            })
        ));
    }

    #[test]
    fn unavailable_questions_are_listed() {
        let err = FinalizeError::QuestionsUnavailable { ids: vec!["q1".to_string(), "q7".to_string()] };
        assert_eq!(err.to_string(), "questions are no longer available: q1, q7");
    }

    #[test]
    fn export_errors_keep_their_context_chain() {
        let source = anyhow::anyhow!("disk full").context("Failed to write paper.md");
        let err = FinalizeError::Export(source);
        assert_eq!(err.to_string(), "document export failed: Failed to write paper.md: disk full");
    }
}
