//! Grader feedback and manual score overrides.

use chrono::{DateTime, Utc};

use crate::error::FeedbackError;
use crate::model::Submission;
use crate::traits::FeedbackUpdate;

/// Who is providing feedback.
#[derive(Debug, Clone)]
pub struct Grader {
    pub id: String,
    pub name: Option<String>,
}

/// Check a feedback update against the submission it targets.
pub fn validate_feedback(
    submission: &Submission,
    update: &FeedbackUpdate,
) -> Result<(), FeedbackError> {
    if let Some(manual) = update.manual_score {
        if manual > submission.total_questions {
            return Err(FeedbackError::ManualScoreTooHigh {
                manual,
                total: submission.total_questions,
            });
        }
    }
    Ok(())
}

/// Apply a feedback update. The automatic `score` is never touched.
pub fn apply_feedback(
    submission: &mut Submission,
    update: &FeedbackUpdate,
    grader: &Grader,
    at: DateTime<Utc>,
) -> Result<(), FeedbackError> {
    validate_feedback(submission, update)?;

    let feedback = update.feedback.trim();
    submission.feedback = if feedback.is_empty() {
        None
    } else {
        Some(feedback.to_string())
    };
    submission.manual_score = update.manual_score;
    submission.feedback_provided_by = Some(grader.id.clone());
    submission.feedback_provided_by_name = grader.name.clone();
    submission.feedback_provided_at = Some(at);

    tracing::debug!(
        submission = %submission.id,
        manual_score = ?submission.manual_score,
        "feedback applied"
    );
    Ok(())
}
