pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::db::types::UserRole;
use crate::schemas::question::QuestionCreate;
use crate::services::paper_document::MarkdownRenderer;
use crate::services::question_generation::{GenerationRequest, QuestionGenerator};

/// Replays a draft authoring session and finalizes the resulting paper.
pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = parse_draft_args(env::args().skip(1), env::var("QPAPER_DRAFT_PATH").ok())?;

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;
    let state = AppState::new(settings, db_pool);

    tracing::info!(
        draft = %args.draft_path.display(),
        dry_run = args.dry_run,
        environment = %state.settings().runtime().environment.as_str(),
        "Replaying paper draft"
    );

    let result = replay_and_finalize(&state, &args).await;
    core::metrics::write_textfile(state.settings()).await?;
    result
}

async fn replay_and_finalize(state: &AppState, args: &DraftArgs) -> Result<()> {
    let draft = services::paper_draft::load_draft(&args.draft_path).await?;

    let lecturer = repositories::users::find_by_id(state.db(), &draft.lecturer_id)
        .await
        .context("Failed to load lecturer")?
        .ok_or_else(|| anyhow!("Lecturer {} not found", draft.lecturer_id))?;
    if lecturer.role != UserRole::Lecturer || !lecturer.is_approved {
        return Err(anyhow!("User {} is not an approved lecturer", lecturer.id));
    }

    let questions = services::paper_draft::load_draft_questions(state.db(), &draft).await?;
    let outcome = services::paper_draft::replay_steps(&draft.shape, &draft.steps, &questions);
    tracing::info!(
        steps = draft.steps.len(),
        rejected = outcome.rejections.len(),
        main_questions = outcome.state.main_questions.len(),
        total_marks = outcome.state.total_marks(),
        "Draft replayed"
    );

    let remaining = services::question_bank::list_addable_questions(
        state.db(),
        &lecturer.id,
        &draft.metadata.subject_id,
        None,
        &outcome.state,
    )
    .await?;
    tracing::info!(remaining = remaining.len(), "Questions still addable for this subject");

    if args.dry_run {
        let normalized = services::paper_validator::validate(&outcome.state, &draft.shape)?;
        println!("{}", serde_json::to_string_pretty(&normalized)?);
        return Ok(());
    }

    let result = services::paper_finalize::finalize_paper(
        state,
        &lecturer,
        &outcome.state,
        &draft.shape,
        &draft.metadata,
        &MarkdownRenderer,
    )
    .await?;

    let rejected: Vec<_> = outcome
        .rejections
        .iter()
        .map(|rejection| {
            json!({"step": rejection.step, "kind": rejection.kind, "message": rejection.message})
        })
        .collect();
    let summary = json!({
        "paper_id": result.paper.id,
        "created_at": core::time::format_primitive(result.paper.created_at),
        "document_url": result.paper.document_url,
        "document_path": result.document_path.display().to_string(),
        "leftover_report": result.leftover_report.as_ref().map(|report| &report.file_name),
        "rejected_steps": rejected,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Generates candidate questions for a topic and optionally saves them to a lecturer's pool.
pub async fn run_generate() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = parse_generate_args(env::args().skip(1))?;

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let generator = QuestionGenerator::from_settings(&settings)?;
    let questions = generator.generate(&args.request).await?;
    println!("{}", serde_json::to_string_pretty(&questions)?);

    if let Some(target) = &args.save {
        let db_pool = db::init_pool(&settings).await?;
        db::run_migrations(&db_pool).await?;

        for generated in &questions {
            let payload = QuestionCreate {
                lecturer_id: target.lecturer_id.clone(),
                subject_id: target.subject_id.clone(),
                module_id: target.module_id.clone(),
                topic: args.request.topic.clone(),
                question: generated.text.clone(),
                marks: target.marks,
                course_outcome: target.course_outcome.clone(),
                learning_outcome: target.learning_outcome.clone(),
            };
            services::question_bank::save_question(&db_pool, payload).await?;
        }
        tracing::info!(saved = questions.len(), lecturer_id = %target.lecturer_id, "Questions saved");
    }

    core::metrics::write_textfile(&settings).await?;
    Ok(())
}

#[derive(Debug, PartialEq)]
struct DraftArgs {
    draft_path: PathBuf,
    dry_run: bool,
}

fn parse_draft_args(
    args: impl Iterator<Item = String>,
    default_path: Option<String>,
) -> Result<DraftArgs> {
    let mut draft_path = default_path;
    let mut dry_run = false;

    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--draft" => {
                draft_path = Some(args.next().ok_or_else(|| anyhow!("--draft missing value"))?);
            }
            "--dry-run" => dry_run = true,
            _ => return Err(anyhow!("Unknown argument: {arg}")),
        }
    }

    let draft_path = draft_path
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("--draft <path> or QPAPER_DRAFT_PATH is required"))?;
    Ok(DraftArgs { draft_path, dry_run })
}

#[derive(Debug, PartialEq)]
struct SaveTarget {
    lecturer_id: String,
    subject_id: String,
    module_id: String,
    marks: f64,
    course_outcome: String,
    learning_outcome: String,
}

#[derive(Debug)]
struct GenerateArgs {
    request: GenerationRequest,
    save: Option<SaveTarget>,
}

fn parse_generate_args(args: impl Iterator<Item = String>) -> Result<GenerateArgs> {
    let mut values = std::collections::HashMap::new();
    let mut save = false;

    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--save" => save = true,
            "--topic" | "--max-weightage" | "--count" | "--lecturer" | "--subject" | "--module"
            | "--marks" | "--co" | "--btl" => {
                let value = args.next().ok_or_else(|| anyhow!("{arg} missing value"))?;
                values.insert(arg, value);
            }
            _ => return Err(anyhow!("Unknown argument: {arg}")),
        }
    }

    let mut take = |flag: &str| values.remove(flag).ok_or_else(|| anyhow!("{flag} is required"));

    let request = GenerationRequest {
        topic: take("--topic")?,
        max_weightage: take("--max-weightage")?
            .parse()
            .context("--max-weightage must be a positive integer")?,
        number_of_questions: take("--count")?.parse().context("--count must be a positive integer")?,
    };

    let save = if save {
        Some(SaveTarget {
            lecturer_id: take("--lecturer")?,
            subject_id: take("--subject")?,
            module_id: take("--module")?,
            marks: take("--marks")?.parse().context("--marks must be a number")?,
            course_outcome: take("--co")?,
            learning_outcome: take("--btl")?,
        })
    } else {
        None
    };

    Ok(GenerateArgs { request, save })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        raw.iter().map(|value| value.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn draft_path_falls_back_to_env_default() {
        let parsed = parse_draft_args(args(&["--dry-run"]), Some("drafts/a.json".to_string()))
            .expect("args");
        assert_eq!(
            parsed,
            DraftArgs { draft_path: PathBuf::from("drafts/a.json"), dry_run: true }
        );

        let parsed = parse_draft_args(args(&["--draft", "b.json"]), Some("a.json".to_string()))
            .expect("args");
        assert_eq!(parsed.draft_path, PathBuf::from("b.json"));
        assert!(!parsed.dry_run);
    }

    #[test]
    fn draft_args_require_a_path_and_known_flags() {
        assert!(parse_draft_args(args(&[]), None).is_err());
        assert!(parse_draft_args(args(&["--draft"]), None).is_err());
        assert!(parse_draft_args(args(&["--verbose"]), Some("a.json".to_string())).is_err());
    }

    #[test]
    fn generate_args_without_save() {
        let parsed =
            parse_generate_args(args(&["--topic", "Heaps", "--max-weightage", "10", "--count", "3"]))
                .expect("args");
        assert_eq!(parsed.request.topic, "Heaps");
        assert_eq!(parsed.request.max_weightage, 10);
        assert_eq!(parsed.request.number_of_questions, 3);
        assert!(parsed.save.is_none());
    }

    #[test]
    fn generate_args_with_save_need_pool_fields() {
        let base = ["--topic", "Heaps", "--max-weightage", "10", "--count", "3", "--save"];
        assert!(parse_generate_args(args(&base)).is_err());

        let mut full = base.to_vec();
        full.extend([
            "--lecturer", "lecturer-1", "--subject", "subject-1", "--module", "module-1",
            "--marks", "2.5", "--co", "CO1", "--btl", "L2",
        ]);
        let parsed = parse_generate_args(args(&full)).expect("args");
        assert_eq!(
            parsed.save,
            Some(SaveTarget {
                lecturer_id: "lecturer-1".to_string(),
                subject_id: "subject-1".to_string(),
                module_id: "module-1".to_string(),
                marks: 2.5,
                course_outcome: "CO1".to_string(),
                learning_outcome: "L2".to_string(),
            })
        );
    }

    #[test]
    fn generate_args_reject_bad_numbers() {
        let parsed =
            parse_generate_args(args(&["--topic", "Heaps", "--max-weightage", "ten", "--count", "3"]));
        assert!(parsed.is_err());
    }
}
