//! Result view: score, percentage, and colour band.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{SubmitResponse, Submission};

/// Display band for a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    /// 80% and above.
    Green,
    /// 60% up to 80%.
    Yellow,
    /// Below 60%.
    Red,
}

impl ScoreBand {
    /// CSS colour used by the HTML review page.
    pub fn css_color(&self) -> &'static str {
        match self {
            ScoreBand::Green => "#16a34a",
            ScoreBand::Yellow => "#ca8a04",
            ScoreBand::Red => "#dc2626",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Green => write!(f, "green"),
            ScoreBand::Yellow => write!(f, "yellow"),
            ScoreBand::Red => write!(f, "red"),
        }
    }
}

/// A score out of a question count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub score: u32,
    pub total_questions: u32,
}

impl ResultSummary {
    pub fn new(score: u32, total_questions: u32) -> Self {
        Self {
            score,
            total_questions,
        }
    }

    /// Summary of a stored submission, using its effective score.
    pub fn for_submission(submission: &Submission) -> Self {
        Self::new(submission.effective_score(), submission.total_questions)
    }

    /// `round(100 * score / total)`; 0 for an empty assessment.
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        (f64::from(self.score) * 100.0 / f64::from(self.total_questions)).round() as u32
    }

    /// Band from the unrounded ratio.
    pub fn band(&self) -> ScoreBand {
        let scaled = u64::from(self.score) * 100;
        let total = u64::from(self.total_questions);
        if total > 0 && scaled >= 80 * total {
            ScoreBand::Green
        } else if total > 0 && scaled >= 60 * total {
            ScoreBand::Yellow
        } else {
            ScoreBand::Red
        }
    }
}

impl From<SubmitResponse> for ResultSummary {
    fn from(response: SubmitResponse) -> Self {
        Self::new(response.score, response.total_questions)
    }
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}%)",
            self.score,
            self.total_questions,
            self.percentage()
        )
    }
}

/// Format a countdown as `m:ss`.
pub fn format_remaining(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
