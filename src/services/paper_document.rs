//! Printable content of a finalized paper.
//!
//! `build_document` fixes what a paper shows (ordering, numbering, operator placement, marks);
//! a [`DocumentRenderer`] only decides how it looks.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::time::format_date;
use crate::db::models::{CollegeDetails, QuestionPaper};
use crate::schemas::paper::Operator;

const USN_LINE: &str = "USN:____________";
const DEFAULT_COLLEGE_NAME: &str = "College Name";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branding {
    pub(crate) college_name: String,
    pub(crate) college_address: Option<String>,
    pub(crate) department: Option<String>,
    pub(crate) logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DocumentRow {
    Question {
        label: String,
        text: String,
        marks: String,
        course_outcome: String,
        learning_outcome: String,
    },
    Separator(Operator),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PaperDocument {
    pub(crate) header: String,
    pub(crate) branding: Branding,
    pub(crate) title: String,
    /// Left/right cell pairs of the details block; the right cell may be empty.
    pub(crate) details: Vec<(String, String)>,
    pub(crate) table_header: [String; 5],
    pub(crate) rows: Vec<DocumentRow>,
}

pub(crate) fn build_document(
    paper: &QuestionPaper,
    college: Option<&CollegeDetails>,
) -> PaperDocument {
    let non_empty = |value: &str| Some(value.trim().to_string()).filter(|v| !v.is_empty());

    let branding = Branding {
        college_name: college
            .and_then(|details| non_empty(&details.college_name))
            .unwrap_or_else(|| DEFAULT_COLLEGE_NAME.to_string()),
        college_address: college.and_then(|details| non_empty(&details.college_address)),
        department: college.and_then(|details| non_empty(&details.department)),
        logo_url: college.and_then(|details| non_empty(&details.logo_url)),
    };

    let mut details = vec![
        (
            format!("Semester: {}", to_roman(paper.semester)),
            format!("Time: {} minutes", paper.assessment_time),
        ),
        (
            format!("Date: {}", format_date(paper.assessment_date)),
            format!("Max Marks: {}", format_marks(paper.maximum_marks)),
        ),
        (format!("Subject: {}", paper.subject_name), String::new()),
        (format!("Subject Code: {}", paper.subject_code), String::new()),
        (format!("Faculty: {}", paper.faculty_name), String::new()),
    ];
    if !paper.course_outcome.is_empty() {
        details.push((format!("Course Outcome (CO): {}", paper.course_outcome), String::new()));
    }
    if !paper.learning_outcome.is_empty() {
        details.push((format!("BTL: {}", paper.learning_outcome), String::new()));
    }

    let table_header = [
        "Q.NO".to_string(),
        format!("Answer any {} question(s)", paper.number_of_questions_to_attend),
        "MARKS".to_string(),
        "CO".to_string(),
        "BTL".to_string(),
    ];

    let groups = &paper.questions.0;
    let mut rows = Vec::new();
    for (index, main) in groups.iter().enumerate() {
        for sub in &main.sub_questions {
            let label = if sub.letter.is_empty() {
                main.question_number.to_string()
            } else {
                format!("{}{}.", main.question_number, sub.letter)
            };
            rows.push(DocumentRow::Question {
                label,
                text: sub.text.clone(),
                marks: format_marks(sub.marks),
                course_outcome: sub.course_outcome.clone(),
                learning_outcome: sub.learning_outcome.clone(),
            });
        }
        if index + 1 < groups.len() {
            rows.push(DocumentRow::Separator(main.operator));
        }
    }

    PaperDocument {
        header: USN_LINE.to_string(),
        branding,
        title: paper.assessment_type.as_str().to_string(),
        details,
        table_header,
        rows,
    }
}

/// Semesters `1..=8` as Roman numerals; larger values clamp to `VIII`.
pub(crate) fn to_roman(semester: i32) -> &'static str {
    const NUMERALS: [&str; 8] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII"];
    if semester < 1 {
        return "";
    }
    let index = (semester.min(8) - 1) as usize;
    NUMERALS[index]
}

pub(crate) fn format_marks(marks: f64) -> String {
    if marks.fract() == 0.0 {
        format!("{marks:.0}")
    } else {
        let text = format!("{marks:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

pub(crate) trait DocumentRenderer: Send + Sync {
    fn extension(&self) -> &'static str;
    fn render(&self, document: &PaperDocument) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MarkdownRenderer;

impl DocumentRenderer for MarkdownRenderer {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn render(&self, document: &PaperDocument) -> Result<Vec<u8>> {
        let mut out = String::new();
        writeln!(out, "<p align=\"right\"><b>{}</b></p>\n", document.header)?;

        let branding = &document.branding;
        if let Some(logo) = &branding.logo_url {
            writeln!(out, "![logo]({logo})\n")?;
        }
        writeln!(out, "# {}\n", branding.college_name)?;
        if let Some(address) = &branding.college_address {
            writeln!(out, "{address}\n")?;
        }
        if let Some(department) = &branding.department {
            writeln!(out, "**{department}**\n")?;
        }
        writeln!(out, "## {}\n", document.title)?;

        writeln!(out, "| | |\n|---|---|")?;
        for (left, right) in &document.details {
            writeln!(out, "| {} | {} |", escape_cell(left), escape_cell(right))?;
        }
        writeln!(out)?;

        writeln!(out, "| {} |", document.table_header.join(" | "))?;
        writeln!(out, "|---|---|---|---|---|")?;
        for row in &document.rows {
            match row {
                DocumentRow::Question { label, text, marks, course_outcome, learning_outcome } => {
                    writeln!(
                        out,
                        "| {label} | {} | {marks} | {} | {} |",
                        escape_cell(text),
                        escape_cell(course_outcome),
                        escape_cell(learning_outcome)
                    )?;
                }
                DocumentRow::Separator(operator) => {
                    writeln!(out, "| | **{}** | | | |", operator.as_str())?;
                }
            }
        }

        Ok(out.into_bytes())
    }
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', "<br>")
}

/// Renders and stores a paper document, returning the written path.
pub(crate) async fn write_document(
    renderer: &dyn DocumentRenderer,
    document: &PaperDocument,
    output_dir: &Path,
    file_stem: &str,
) -> Result<PathBuf> {
    let bytes = renderer.render(document).context("Failed to render paper document")?;
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let path = output_dir.join(format!("{file_stem}.{}", renderer.extension()));
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
