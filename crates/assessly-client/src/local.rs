//! File-backed backend for offline use.
//!
//! Assessments are loaded once from a directory of TOML/JSON files.
//! Submissions are kept in a single JSON file and scored with the core
//! reference scorer.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;

use assessly_core::error::BackendError;
use assessly_core::grading::{apply_feedback, Grader};
use assessly_core::model::{route_id, Answers, Assessment, SubmitResponse, Submission};
use assessly_core::parser::load_assessment_directory;
use assessly_core::scoring::{score_answers, ShortAnswerPolicy};
use assessly_core::traits::{AssessmentBackend, FeedbackUpdate};

pub struct LocalBackend {
    assessments: Vec<Assessment>,
    submissions_file: PathBuf,
    user_id: String,
    policy: ShortAnswerPolicy,
    /// Serializes read-modify-write cycles on the submissions file.
    write_lock: Mutex<()>,
}

impl LocalBackend {
    /// Load assessments from `assessments_dir`. The submissions file is
    /// created on first write.
    pub fn open(
        assessments_dir: &Path,
        submissions_file: &Path,
        user_id: &str,
        policy: ShortAnswerPolicy,
    ) -> Result<Self> {
        let assessments = load_assessment_directory(assessments_dir).with_context(|| {
            format!("failed to load assessments from {}", assessments_dir.display())
        })?;
        tracing::debug!(
            count = assessments.len(),
            dir = %assessments_dir.display(),
            "local backend opened"
        );
        Ok(Self::with_assessments(
            assessments,
            submissions_file,
            user_id,
            policy,
        ))
    }

    pub fn with_assessments(
        assessments: Vec<Assessment>,
        submissions_file: &Path,
        user_id: &str,
        policy: ShortAnswerPolicy,
    ) -> Self {
        Self {
            assessments,
            submissions_file: submissions_file.to_path_buf(),
            user_id: user_id.to_string(),
            policy,
            write_lock: Mutex::new(()),
        }
    }

    fn find(&self, id: &str) -> Result<&Assessment, BackendError> {
        let wanted = route_id(id);
        self.assessments
            .iter()
            .find(|a| a.route_id() == wanted)
            .ok_or_else(|| BackendError::NotFound(format!("assessment {wanted} not found")))
    }

    fn read_submissions(&self) -> Result<Vec<Submission>, BackendError> {
        if !self.submissions_file.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.submissions_file).map_err(|e| {
            BackendError::Storage(format!(
                "failed to read {}: {e}",
                self.submissions_file.display()
            ))
        })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            BackendError::Storage(format!(
                "failed to parse {}: {e}",
                self.submissions_file.display()
            ))
        })
    }

    fn write_submissions(&self, submissions: &[Submission]) -> Result<(), BackendError> {
        let storage = |e: &dyn std::fmt::Display| {
            BackendError::Storage(format!(
                "failed to write {}: {e}",
                self.submissions_file.display()
            ))
        };
        if let Some(parent) = self.submissions_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| storage(&e))?;
            }
        }
        let json = serde_json::to_string_pretty(submissions).map_err(|e| storage(&e))?;
        let tmp = self.submissions_file.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| storage(&e))?;
        std::fs::rename(&tmp, &self.submissions_file).map_err(|e| storage(&e))?;
        Ok(())
    }
}

#[async_trait]
impl AssessmentBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn list_assessments(&self) -> Result<Vec<Assessment>, BackendError> {
        Ok(self.assessments.clone())
    }

    async fn fetch_assessment(&self, id: &str) -> Result<Assessment, BackendError> {
        self.find(id).cloned()
    }

    async fn submit(
        &self,
        assessment_id: &str,
        answers: &Answers,
    ) -> Result<SubmitResponse, BackendError> {
        let assessment = self.find(assessment_id)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut submissions = self.read_submissions()?;
        let already = submissions
            .iter()
            .any(|s| s.user_id == self.user_id && route_id(&s.assessment_id) == assessment.route_id());
        if already {
            return Err(BackendError::AlreadySubmitted(
                "You have already submitted this assessment".into(),
            ));
        }

        let outcome = score_answers(&assessment.questions, answers, self.policy);
        if outcome.pending_review > 0 {
            tracing::info!(
                pending = outcome.pending_review,
                "short answers left for manual review"
            );
        }

        submissions.push(Submission {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            assessment_id: assessment.id.clone(),
            answers: answers.clone(),
            score: outcome.score,
            total_questions: outcome.total_questions,
            submitted_at: Utc::now(),
            manual_score: None,
            feedback: None,
            student_name: None,
            student_email: None,
            assessment_title: Some(assessment.title.clone()),
            feedback_provided_by: None,
            feedback_provided_by_name: None,
            feedback_provided_at: None,
        });
        self.write_submissions(&submissions)?;

        tracing::info!(
            assessment = assessment.route_id(),
            score = outcome.score,
            total = outcome.total_questions,
            "submission stored"
        );
        Ok(outcome.response())
    }

    async fn list_submissions(&self) -> Result<Vec<Submission>, BackendError> {
        let mut submissions = self.read_submissions()?;
        submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(submissions)
    }

    async fn save_feedback(
        &self,
        submission_id: &str,
        update: &FeedbackUpdate,
    ) -> Result<(), BackendError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut submissions = self.read_submissions()?;
        let submission = submissions
            .iter_mut()
            .find(|s| s.id == submission_id)
            .ok_or_else(|| BackendError::NotFound(format!("submission {submission_id} not found")))?;

        let grader = Grader {
            id: self.user_id.clone(),
            name: None,
        };
        apply_feedback(submission, update, &grader, Utc::now())?;
        self.write_submissions(&submissions)
    }
}
