//! The `assessly feedback` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use assessly_core::grading::validate_feedback;
use assessly_core::result::ResultSummary;
use assessly_core::traits::FeedbackUpdate;

use super::open_backend;

pub async fn execute(
    submission_id: String,
    feedback: Option<String>,
    manual_score: Option<u32>,
    clear_manual_score: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        feedback.is_some() || manual_score.is_some() || clear_manual_score,
        "nothing to save: pass --feedback, --manual-score or --clear-manual-score"
    );

    let backend = open_backend(config_path.as_deref())?;
    let submissions = backend
        .list_submissions()
        .await
        .context("failed to load submissions")?;
    let submission = submissions
        .iter()
        .find(|s| s.id == submission_id)
        .with_context(|| format!("submission {submission_id} not found"))?;

    // The update replaces both fields, so carry over whatever is not being changed.
    let update = FeedbackUpdate {
        feedback: feedback
            .or_else(|| submission.feedback.clone())
            .unwrap_or_default(),
        manual_score: if clear_manual_score {
            None
        } else {
            manual_score.or(submission.manual_score)
        },
    };
    validate_feedback(submission, &update)?;

    backend
        .save_feedback(&submission_id, &update)
        .await
        .with_context(|| format!("failed to save feedback for {submission_id}"))?;

    let effective = update.manual_score.unwrap_or(submission.score);
    let summary = ResultSummary::new(effective, submission.total_questions);
    println!("Feedback saved for submission {submission_id}.");
    println!("Effective score: {summary} [{}]", summary.band());
    Ok(())
}
