//! Mock backend for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use assessly_core::error::BackendError;
use assessly_core::grading::{apply_feedback, Grader};
use assessly_core::model::{route_id, Answers, Assessment, SubmitResponse, Submission};
use assessly_core::scoring::{score_answers, ShortAnswerPolicy};
use assessly_core::traits::{AssessmentBackend, FeedbackUpdate};

/// User recorded on every submission the mock stores.
pub const MOCK_USER: &str = "mock-user";

/// An in-memory backend for exercising sessions without a server.
///
/// Scores with the reference scorer unless a failure has been queued, and
/// accepts one submission per assessment for [`MOCK_USER`].
pub struct MockBackend {
    assessments: Vec<Assessment>,
    policy: ShortAnswerPolicy,
    /// Artificial latency applied to every submit.
    submit_delay: Option<Duration>,
    /// Errors returned by upcoming submits, in order.
    queued_failures: Mutex<VecDeque<BackendError>>,
    /// Number of submit calls made.
    submit_count: AtomicU32,
    /// Answers from the last submit call.
    last_answers: Mutex<Option<Answers>>,
    submissions: Mutex<Vec<Submission>>,
    feedback: Mutex<Vec<(String, FeedbackUpdate)>>,
}

impl MockBackend {
    pub fn new(assessments: Vec<Assessment>) -> Self {
        Self {
            assessments,
            policy: ShortAnswerPolicy::Manual,
            submit_delay: None,
            queued_failures: Mutex::new(VecDeque::new()),
            submit_count: AtomicU32::new(0),
            last_answers: Mutex::new(None),
            submissions: Mutex::new(Vec::new()),
            feedback: Mutex::new(Vec::new()),
        }
    }

    pub fn with_policy(mut self, policy: ShortAnswerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    /// Seed submissions returned by `list_submissions`.
    pub fn with_submissions(self, submissions: Vec<Submission>) -> Self {
        *self.submissions.lock().unwrap() = submissions;
        self
    }

    /// Make the next submit fail with `error`.
    pub fn fail_next_submit(&self, error: BackendError) {
        self.queued_failures.lock().unwrap().push_back(error);
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count.load(Ordering::Relaxed)
    }

    pub fn last_answers(&self) -> Option<Answers> {
        self.last_answers.lock().unwrap().clone()
    }

    /// Feedback updates accepted, in call order.
    pub fn feedback_updates(&self) -> Vec<(String, FeedbackUpdate)> {
        self.feedback.lock().unwrap().clone()
    }

    fn find(&self, id: &str) -> Result<&Assessment, BackendError> {
        let wanted = route_id(id);
        self.assessments
            .iter()
            .find(|a| a.route_id() == wanted)
            .ok_or_else(|| BackendError::NotFound(format!("assessment {wanted} not found")))
    }
}

#[async_trait]
impl AssessmentBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
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
        self.submit_count.fetch_add(1, Ordering::Relaxed);
        *self.last_answers.lock().unwrap() = Some(answers.clone());

        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.queued_failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        let assessment = self.find(assessment_id)?;
        let mut submissions = self.submissions.lock().unwrap();
        if submissions
            .iter()
            .any(|s| s.user_id == MOCK_USER && route_id(&s.assessment_id) == assessment.route_id())
        {
            return Err(BackendError::AlreadySubmitted(
                "You have already submitted this assessment".into(),
            ));
        }

        let outcome = score_answers(&assessment.questions, answers, self.policy);
        submissions.push(Submission {
            id: format!("mock-{}", self.submit_count()),
            user_id: MOCK_USER.into(),
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
        Ok(outcome.response())
    }

    async fn list_submissions(&self) -> Result<Vec<Submission>, BackendError> {
        Ok(self.submissions.lock().unwrap().clone())
    }

    async fn save_feedback(
        &self,
        submission_id: &str,
        update: &FeedbackUpdate,
    ) -> Result<(), BackendError> {
        let mut submissions = self.submissions.lock().unwrap();
        let submission = submissions
            .iter_mut()
            .find(|s| s.id == submission_id)
            .ok_or_else(|| BackendError::NotFound(format!("submission {submission_id} not found")))?;

        let grader = Grader {
            id: MOCK_USER.into(),
            name: None,
        };
        apply_feedback(submission, update, &grader, Utc::now())?;
        self.feedback
            .lock()
            .unwrap()
            .push((submission_id.to_string(), update.clone()));
        Ok(())
    }
}
