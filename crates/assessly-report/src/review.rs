//! Review report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use assessly_core::model::{route_id, Submission};
use assessly_core::result::{ResultSummary, ScoreBand};

/// Review of a set of submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Assessment the rows were restricted to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_filter: Option<String>,
    pub summary: ReviewSummary,
    /// Newest first.
    pub rows: Vec<ReviewRow>,
}

/// Aggregate figures over the reviewed submissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub submissions: usize,
    /// Mean of the per-row percentages, 0 when there are no rows.
    pub average_percentage: f64,
    pub awaiting_feedback: usize,
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
}

/// One submission as shown to a grader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRow {
    pub submission_id: String,
    pub student: String,
    pub assessment: String,
    /// Effective score: the manual score if a grader set one.
    pub score: u32,
    /// Automatic score as returned at submission time.
    pub automatic_score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub band: ScoreBand,
    pub overridden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl ReviewRow {
    pub fn from_submission(submission: &Submission) -> Self {
        let summary = ResultSummary::for_submission(submission);
        let student = submission
            .student_name
            .clone()
            .or_else(|| submission.student_email.clone())
            .unwrap_or_else(|| submission.user_id.clone());
        let assessment = submission
            .assessment_title
            .clone()
            .unwrap_or_else(|| route_id(&submission.assessment_id).to_string());

        Self {
            submission_id: submission.id.clone(),
            student,
            assessment,
            score: summary.score,
            automatic_score: submission.score,
            total_questions: summary.total_questions,
            percentage: summary.percentage(),
            band: summary.band(),
            overridden: submission.manual_score.is_some(),
            feedback: submission.has_feedback().then(|| submission.feedback.clone()).flatten(),
            feedback_by: submission
                .feedback_provided_by_name
                .clone()
                .or_else(|| submission.feedback_provided_by.clone()),
            submitted_at: submission.submitted_at,
        }
    }
}

impl ReviewReport {
    /// Build a review, optionally restricted to one assessment (matched
    /// with or without the storage prefix).
    pub fn build(submissions: &[Submission], assessment: Option<&str>) -> Self {
        let wanted = assessment.map(route_id);
        let mut rows: Vec<ReviewRow> = submissions
            .iter()
            .filter(|s| wanted.is_none_or(|w| route_id(&s.assessment_id) == w))
            .map(ReviewRow::from_submission)
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

        let mut summary = ReviewSummary {
            submissions: rows.len(),
            ..ReviewSummary::default()
        };
        for row in &rows {
            match row.band {
                ScoreBand::Green => summary.green += 1,
                ScoreBand::Yellow => summary.yellow += 1,
                ScoreBand::Red => summary.red += 1,
            }
            if row.feedback.is_none() {
                summary.awaiting_feedback += 1;
            }
        }
        if !rows.is_empty() {
            let total: u32 = rows.iter().map(|r| r.percentage).sum();
            summary.average_percentage = f64::from(total) / rows.len() as f64;
        }

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            assessment_filter: wanted.map(str::to_string),
            summary,
            rows,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }
}
