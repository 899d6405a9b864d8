//! HTML review page generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use assessly_core::result::ScoreBand;

use crate::review::ReviewReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate the review page for a report.
pub fn generate_html(report: &ReviewReport) -> String {
    let mut html = String::new();
    let title = match &report.assessment_filter {
        Some(id) => format!("Submissions for {}", html_escape(id)),
        None => "All submissions".to_string(),
    };

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>assessly review: {title}</title>\n"));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{title}</h1>\n"));
    html.push_str(&format!(
        "<p class=\"meta\">{} submissions | {} awaiting feedback | generated {}</p>\n",
        report.summary.submissions,
        report.summary.awaiting_feedback,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str(&format!(
        "<p>Average score: <strong>{:.1}%</strong></p>\n",
        report.summary.average_percentage
    ));
    if report.summary.submissions > 0 {
        html.push_str(&generate_band_chart(report));
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Submissions</h2>\n");
    if report.rows.is_empty() {
        html.push_str("<p class=\"empty\">No submissions yet.</p>\n");
    } else {
        html.push_str("<table class=\"results-table\" id=\"results\">\n");
        html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Student</th><th onclick=\"sortTable(1)\">Assessment</th><th onclick=\"sortTable(2)\">Score</th><th onclick=\"sortTable(3)\">Submitted</th><th>Feedback</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for row in &report.rows {
            let override_note = if row.overridden {
                format!(
                    " <span class=\"override\">(auto {}/{})</span>",
                    row.automatic_score, row.total_questions
                )
            } else {
                String::new()
            };
            let feedback = match (&row.feedback, &row.feedback_by) {
                (Some(text), Some(by)) => format!(
                    "{}<br><span class=\"meta\">by {}</span>",
                    html_escape(text),
                    html_escape(by)
                ),
                (Some(text), None) => html_escape(text),
                (None, _) => "<span class=\"pending\">awaiting feedback</span>".to_string(),
            };
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td><span class=\"score\" style=\"color: {}\">{}/{} ({}%)</span>{}</td><td>{}</td><td>{}</td></tr>\n",
                html_escape(&row.student),
                html_escape(&row.assessment),
                row.band.css_color(),
                row.score,
                row.total_questions,
                row.percentage,
                override_note,
                row.submitted_at.format("%Y-%m-%d %H:%M"),
                feedback,
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write the review page to a file.
pub fn write_html_report(report: &ReviewReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_band_chart(report: &ReviewReport) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 120;

    let bands = [
        (ScoreBand::Green, "80% and above", report.summary.green),
        (ScoreBand::Yellow, "60% to 79%", report.summary.yellow),
        (ScoreBand::Red, "below 60%", report.summary.red),
    ];
    let total = report.summary.submissions.max(1);
    let total_height = bands.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (band, label, count)) in bands.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = count * max_width / total;

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            label
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width,
            y,
            width,
            bar_height,
            band.css_color()
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            count
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --muted: #6b7280; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --muted: #9ca3af; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta, .override, .pending { color: var(--muted); }
.pending { font-style: italic; }
.score { font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::tests::submission;

    fn make_test_report() -> ReviewReport {
        let mut reviewed = submission("s1", "quiz", 1, 3, 2);
        reviewed.manual_score = Some(3);
        reviewed.feedback = Some("Short answers were <b>correct</b>".into());
        reviewed.feedback_provided_by_name = Some("Ms. Rivera".into());
        reviewed.student_name = Some("Ada".into());
        reviewed.assessment_title = Some("Quiz".into());
        let pending = submission("s2", "quiz", 1, 3, 1);
        ReviewReport::build(&[reviewed, pending], Some("quiz"))
    }

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&make_test_report());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Submissions for quiz"));
        assert!(html.contains("Ada"));
        assert!(html.contains("3/3 (100%)"));
        assert!(html.contains("(auto 1/3)"));
        assert!(html.contains("awaiting feedback"));
        assert!(html.contains(ScoreBand::Red.css_color()));
        assert!(html.contains("by Ms. Rivera"));
    }

    #[test]
    fn feedback_is_escaped() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("&lt;b&gt;correct&lt;/b&gt;"));
        assert!(!html.contains("<b>correct</b>"));
    }

    #[test]
    fn empty_report_says_so() {
        let html = generate_html(&ReviewReport::build(&[], None));
        assert!(html.contains("No submissions yet."));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.html");

        write_html_report(&report, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
