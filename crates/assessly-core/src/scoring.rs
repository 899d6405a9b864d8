//! Reference scoring function.
//!
//! The backend's submit endpoint is the authority on scores. This module is
//! the reference implementation of that contract: the local and mock
//! backends score with it, and `assessly grade` uses it for authors checking
//! their answer keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerValue, Answers, CorrectAnswer, Question, QuestionKind, SubmitResponse};

/// How short-answer questions are marked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortAnswerPolicy {
    /// Left for a grader: counted incorrect and reported as pending review.
    #[default]
    Manual,
    /// Trimmed, case-insensitive comparison with the reference text.
    ExactMatch,
}

impl fmt::Display for ShortAnswerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortAnswerPolicy::Manual => write!(f, "manual"),
            ShortAnswerPolicy::ExactMatch => write!(f, "exact-match"),
        }
    }
}

impl FromStr for ShortAnswerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(ShortAnswerPolicy::Manual),
            "exact" | "exact-match" | "exact_match" => Ok(ShortAnswerPolicy::ExactMatch),
            other => Err(format!("unknown short-answer policy: {other}")),
        }
    }
}

/// How a single question was marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Correct,
    Incorrect,
    Unanswered,
    /// Short answer awaiting a grader.
    PendingReview,
}

/// Marking of one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionMark {
    pub index: usize,
    pub question_id: String,
    pub verdict: Verdict,
    pub points_awarded: u32,
}

/// Result of scoring a set of answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOutcome {
    /// Number of questions answered correctly.
    pub score: u32,
    /// Number of questions in the assessment, answered or not.
    pub total_questions: u32,
    pub points_earned: u32,
    pub points_possible: u32,
    /// Short answers left for a grader.
    pub pending_review: u32,
    pub marks: Vec<QuestionMark>,
}

impl ScoreOutcome {
    /// The subset of this outcome the submit endpoint returns.
    pub fn response(&self) -> SubmitResponse {
        SubmitResponse {
            score: self.score,
            total_questions: self.total_questions,
        }
    }
}

/// Score answers against an ordered question list.
///
/// Unanswered questions count as incorrect. Answers keyed by an index past
/// the end of `questions` are ignored.
pub fn score_answers(
    questions: &[Question],
    answers: &Answers,
    policy: ShortAnswerPolicy,
) -> ScoreOutcome {
    let mut outcome = ScoreOutcome {
        score: 0,
        total_questions: questions.len() as u32,
        points_earned: 0,
        points_possible: questions.iter().map(|q| q.points).sum(),
        pending_review: 0,
        marks: Vec::with_capacity(questions.len()),
    };

    for (index, question) in questions.iter().enumerate() {
        let verdict = mark_question(question, answers.get(&index), policy);
        let points_awarded = match verdict {
            Verdict::Correct => {
                outcome.score += 1;
                outcome.points_earned += question.points;
                question.points
            }
            Verdict::PendingReview => {
                outcome.pending_review += 1;
                0
            }
            Verdict::Incorrect | Verdict::Unanswered => 0,
        };
        outcome.marks.push(QuestionMark {
            index,
            question_id: question.id.clone(),
            verdict,
            points_awarded,
        });
    }

    outcome
}

fn mark_question(
    question: &Question,
    answer: Option<&AnswerValue>,
    policy: ShortAnswerPolicy,
) -> Verdict {
    let Some(answer) = answer else {
        return Verdict::Unanswered;
    };

    match question.kind {
        QuestionKind::MultipleChoice => match (answer, &question.correct_answer) {
            (AnswerValue::Choice(given), Some(CorrectAnswer::Index(expected)))
                if given == expected =>
            {
                Verdict::Correct
            }
            _ => Verdict::Incorrect,
        },
        QuestionKind::ShortAnswer => {
            let AnswerValue::Text(text) = answer else {
                return Verdict::Incorrect;
            };
            if text.trim().is_empty() {
                return Verdict::Unanswered;
            }
            match policy {
                ShortAnswerPolicy::Manual => Verdict::PendingReview,
                ShortAnswerPolicy::ExactMatch => match &question.correct_answer {
                    Some(CorrectAnswer::Text(expected))
                        if normalize(expected) == normalize(text) =>
                    {
                        Verdict::Correct
                    }
                    _ => Verdict::Incorrect,
                },
            }
        }
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
