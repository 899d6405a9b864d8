//! Error types for backends and sessions.
//!
//! Backend errors are defined here rather than in `assessly-client` so the
//! session runner and the catalog can classify failures without string
//! matching.

use thiserror::Error;

use crate::model::QuestionKind;
use crate::session::SessionPhase;

/// Errors that can occur when talking to an assessment backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The access token was missing, expired, or rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested assessment or submission does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The taker has already submitted this assessment.
    #[error("already submitted: {0}")]
    AlreadySubmitted(String),

    /// The request was rejected as invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The backend returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Local storage failed (local backend only).
    #[error("storage error: {0}")]
    Storage(String),
}

impl BackendError {
    /// Returns `true` if repeating the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            BackendError::Unauthorized(_)
                | BackendError::NotFound(_)
                | BackendError::AlreadySubmitted(_)
                | BackendError::InvalidRequest(_)
        )
    }
}

/// Errors raised by an assessment session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("assessment has no questions")]
    NoQuestions,

    #[error("assessment has no time limit")]
    NoDuration,

    #[error("question {index} is out of range (assessment has {count} questions)")]
    QuestionOutOfRange { index: usize, count: usize },

    #[error("option {option} is out of range for question {index} ({count} options)")]
    OptionOutOfRange {
        index: usize,
        option: usize,
        count: usize,
    },

    #[error("question {index} is {kind} and does not accept this answer")]
    AnswerKindMismatch { index: usize, kind: QuestionKind },

    /// The session no longer accepts answers or navigation.
    #[error("session is {0} and no longer accepts changes")]
    Closed(SessionPhase),

    /// Another submission is already in flight.
    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("assessment was already submitted")]
    AlreadySubmitted,

    #[error("session was abandoned")]
    Abandoned,

    #[error("submission failed: {0}")]
    Backend(#[from] BackendError),
}

/// Errors raised when a grader's feedback update is rejected.
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("manual score {manual} exceeds total questions {total}")]
    ManualScoreTooHigh { manual: u32, total: u32 },
}

impl From<FeedbackError> for BackendError {
    fn from(err: FeedbackError) -> Self {
        BackendError::InvalidRequest(err.to_string())
    }
}
