//! Backend trait definition.
//!
//! Implemented by the HTTP, local, and mock backends in `assessly-client`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::model::{Answers, Assessment, SubmitResponse, Submission};

/// The remote service that stores assessments and grades submissions.
#[async_trait]
pub trait AssessmentBackend: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// List the assessments available to the current user.
    async fn list_assessments(&self) -> Result<Vec<Assessment>, BackendError>;

    /// Fetch one assessment definition. Question order must be stable.
    async fn fetch_assessment(&self, id: &str) -> Result<Assessment, BackendError>;

    /// Hand in answers and receive the authoritative score.
    async fn submit(
        &self,
        assessment_id: &str,
        answers: &Answers,
    ) -> Result<SubmitResponse, BackendError>;

    /// List submissions visible to the current user (all of them for graders).
    async fn list_submissions(&self) -> Result<Vec<Submission>, BackendError>;

    /// Attach grader feedback and an optional manual score to a submission.
    async fn save_feedback(
        &self,
        submission_id: &str,
        update: &FeedbackUpdate,
    ) -> Result<(), BackendError>;
}

/// Body of the feedback endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackUpdate {
    #[serde(default)]
    pub feedback: String,
    /// `None` clears any manual score and falls back to the automatic one.
    #[serde(default)]
    pub manual_score: Option<u32>,
}
