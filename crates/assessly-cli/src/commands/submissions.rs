//! The `assessly submissions` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};

use assessly_core::result::ScoreBand;
use assessly_report::html::write_html_report;
use assessly_report::review::ReviewReport;

use super::open_backend;

const DEFAULT_HTML_PATH: &str = "assessly-review.html";

pub async fn execute(
    assessment: Option<String>,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let backend = open_backend(config_path.as_deref())?;
    let submissions = backend
        .list_submissions()
        .await
        .context("failed to load submissions")?;
    let report = ReviewReport::build(&submissions, assessment.as_deref());

    match format.as_str() {
        "text" => print_table(&report),
        "json" => match output {
            Some(path) => {
                report.save_json(&path)?;
                eprintln!("Review saved to: {}", path.display());
            }
            None => println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            ),
        },
        "html" => {
            let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_HTML_PATH));
            write_html_report(&report, &path)?;
            eprintln!("HTML review: {}", path.display());
        }
        other => anyhow::bail!("unknown format '{other}' (expected text, json or html)"),
    }

    Ok(())
}

fn print_table(report: &ReviewReport) {
    if report.rows.is_empty() {
        println!("No submissions found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Student",
        "Assessment",
        "Score",
        "Submitted",
        "Feedback",
    ]);

    for row in &report.rows {
        let color = match row.band {
            ScoreBand::Green => Color::Green,
            ScoreBand::Yellow => Color::Yellow,
            ScoreBand::Red => Color::Red,
        };
        let score = if row.overridden {
            format!(
                "{}/{} ({}%) manual",
                row.score, row.total_questions, row.percentage
            )
        } else {
            format!("{}/{} ({}%)", row.score, row.total_questions, row.percentage)
        };
        table.add_row(vec![
            Cell::new(&row.submission_id),
            Cell::new(&row.student),
            Cell::new(&row.assessment),
            Cell::new(score).fg(color),
            Cell::new(row.submitted_at.format("%Y-%m-%d %H:%M")),
            Cell::new(row.feedback.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{table}");
    println!(
        "{} submission(s), average {:.1}%, {} awaiting feedback",
        report.summary.submissions, report.summary.average_percentage, report.summary.awaiting_feedback
    );
}
