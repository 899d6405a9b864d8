//! Core data model types for assessly.
//!
//! These are the wire-level types shared by every backend, the session
//! engine, and the review tooling. Field names follow the backend's JSON
//! contract (camelCase).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage prefix some backends put in front of assessment IDs.
pub const ASSESSMENT_ID_PREFIX: &str = "assessment:";

/// A timed quiz made of ordered questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Unique identifier, possibly carrying the `assessment:` storage prefix.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// What this assessment covers.
    #[serde(default)]
    pub description: String,
    /// Subject category used for catalog filtering.
    #[serde(default)]
    pub category: String,
    /// Time limit in minutes.
    pub duration: u32,
    /// Questions in presentation order. Answers are keyed by index into this list.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Assessment {
    /// The identifier used in backend routes, with any storage prefix removed.
    pub fn route_id(&self) -> &str {
        route_id(&self.id)
    }

    /// Countdown length in seconds.
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration) * 60
    }

    /// Sum of points over all questions.
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

/// Strip the `assessment:` storage prefix from an identifier, if present.
pub fn route_id(id: &str) -> &str {
    id.strip_prefix(ASSESSMENT_ID_PREFIX).unwrap_or(id)
}

/// A single question within an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    /// The question text.
    #[serde(rename = "question", alias = "prompt")]
    pub prompt: String,
    /// Answer options; only meaningful for multiple-choice questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<CorrectAnswer>,
    #[serde(default = "default_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    1
}

/// The two supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    ShortAnswer,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple-choice"),
            QuestionKind::ShortAnswer => write!(f, "short-answer"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "multiple-choice" | "mc" | "choice" => Ok(QuestionKind::MultipleChoice),
            "short-answer" | "sa" | "text" => Ok(QuestionKind::ShortAnswer),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// The expected answer: an option index or reference text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Index(usize),
    Text(String),
}

/// A submitted answer value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Index of the selected multiple-choice option.
    Choice(usize),
    /// Free text for short-answer questions.
    Text(String),
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Choice(i) => write!(f, "option {i}"),
            AnswerValue::Text(t) => write!(f, "{t:?}"),
        }
    }
}

/// Answers keyed by question index. Serializes with string keys (`{"0": 1}`).
pub type Answers = BTreeMap<usize, AnswerValue>;

/// One taker's hand-in for one assessment, as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    pub assessment_id: String,
    #[serde(default)]
    pub answers: Answers,
    /// Automatic score: number of questions answered correctly.
    pub score: u32,
    pub total_questions: u32,
    pub submitted_at: DateTime<Utc>,
    /// Grader override of `score`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_provided_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_provided_by_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_provided_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// The score used for display and grading: the manual score if set.
    pub fn effective_score(&self) -> u32 {
        self.manual_score.unwrap_or(self.score)
    }

    pub fn has_feedback(&self) -> bool {
        self.feedback.as_deref().is_some_and(|f| !f.trim().is_empty())
    }
}

/// Request body of the submit endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub answers: Answers,
}

/// Response of the submit endpoint. This is the authoritative result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub score: u32,
    pub total_questions: u32,
}
