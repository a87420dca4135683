use anyhow::{Context, Result};
use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::core::time::unix_millis;
use crate::db::models::UnusedQuestionReport;
use crate::repositories::questions::UnusedQuestionRow;
use crate::services::paper_document::format_marks;

pub(crate) fn report_file_name(paper_id: &str, now: PrimitiveDateTime) -> String {
    format!("Unused_Questions_{paper_id}_{}.txt", unix_millis(now))
}

pub(crate) fn format_report(rows: &[UnusedQuestionRow]) -> String {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            format!(
                "{}. {}\n   Subject: {}\n   Module: {}\n   Marks: {}\n   Topic: {}\n",
                index + 1,
                row.question,
                row.subject_name.as_deref().unwrap_or("N/A"),
                row.module_name.as_deref().unwrap_or("N/A"),
                format_marks(row.marks),
                row.topic
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stores the list of questions the author still has unused after `paper_id` was finalized.
/// Returns `None` when nothing is left over.
pub(crate) async fn create_report(
    pool: &PgPool,
    lecturer_id: &str,
    paper_id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<UnusedQuestionReport>> {
    let rows = crate::repositories::questions::list_unused_by_lecturer(pool, lecturer_id)
        .await
        .context("Failed to list leftover questions")?;
    if rows.is_empty() {
        return Ok(None);
    }

    let id = Uuid::new_v4().to_string();
    let file_name = report_file_name(paper_id, now);
    let file_content = format_report(&rows);
    let report = crate::repositories::unused_reports::create(
        pool,
        crate::repositories::unused_reports::CreateReport {
            id: &id,
            lecturer_id,
            file_name: &file_name,
            file_content: &file_content,
            question_paper_id: paper_id,
            now,
        },
    )
    .await
    .context("Failed to store leftover report")?;

    tracing::info!(
        paper_id = %paper_id,
        report_id = %report.id,
        leftover = rows.len(),
        "Leftover question report stored"
    );
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixed_timestamp;

    fn row(
        question: &str,
        subject: Option<&str>,
        module: Option<&str>,
        marks: f64,
    ) -> UnusedQuestionRow {
        UnusedQuestionRow {
            question: question.to_string(),
            topic: "Trees".to_string(),
            marks,
            subject_name: subject.map(str::to_string),
            module_name: module.map(str::to_string),
        }
    }

    #[test]
    fn entries_are_numbered_and_blank_line_separated() {
        let rows = vec![
            row("Define a B-tree.", Some("Data Structures"), Some("Module 2"), 5.0),
            row("Explain AVL rotations.", None, None, 2.5),
        ];

        assert_eq!(
            format_report(&rows),
            "1. Define a B-tree.\n   Subject: Data Structures\n   Module: Module 2\n   Marks: 5\n   Topic: Trees\n\
             \n\
             2. Explain AVL rotations.\n   Subject: N/A\n   Module: N/A\n   Marks: 2.5\n   Topic: Trees\n"
        );
    }

    #[test]
    fn empty_pool_formats_to_nothing() {
        assert_eq!(format_report(&[]), "");
    }

    #[test]
    fn file_name_carries_paper_id_and_millis() {
        let now = fixed_timestamp();
        let expected = format!("Unused_Questions_paper-9_{}.txt", unix_millis(now));
        assert_eq!(report_file_name("paper-9", now), expected);
        assert!(expected.ends_with("000.txt"));
    }
}
