//! Assessment file parser.
//!
//! Loads assessments from TOML authoring files or JSON wire-format files,
//! and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{AnswerValue, Answers, Assessment, CorrectAnswer, Question, QuestionKind};

/// Intermediate TOML structure for parsing assessment files.
#[derive(Debug, Deserialize)]
struct TomlAssessmentFile {
    assessment: TomlAssessmentHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlAssessmentHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default = "default_duration")]
    duration_minutes: u32,
}

fn default_duration() -> u32 {
    30
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    prompt: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct_answer: Option<CorrectAnswer>,
    #[serde(default = "default_points")]
    points: u32,
}

fn default_points() -> u32 {
    1
}

/// Parse a single assessment file. The format is chosen by extension:
/// `.json` is the wire format, anything else is TOML.
pub fn parse_assessment(path: &Path) -> Result<Assessment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read assessment file: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        parse_assessment_json(&content, path)
    } else {
        parse_assessment_str(&content, path)
    }
}

/// Parse a JSON wire-format assessment.
pub fn parse_assessment_json(content: &str, source_path: &Path) -> Result<Assessment> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))
}

/// Parse a TOML string into an `Assessment` (useful for testing).
pub fn parse_assessment_str(content: &str, source_path: &Path) -> Result<Assessment> {
    let parsed: TomlAssessmentFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind: QuestionKind = q
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;
            Ok(Question {
                id: q.id,
                kind,
                prompt: q.prompt,
                options: q.options,
                correct_answer: q.correct_answer,
                points: q.points,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Assessment {
        id: parsed.assessment.id,
        title: parsed.assessment.title,
        description: parsed.assessment.description,
        category: parsed.assessment.category,
        duration: parsed.assessment.duration_minutes,
        questions,
    })
}

/// Recursively load all `.toml` and `.json` assessment files from a directory.
pub fn load_assessment_directory(dir: &Path) -> Result<Vec<Assessment>> {
    let mut assessments = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            assessments.extend(load_assessment_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_assessment(&path) {
                Ok(a) => assessments.push(a),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(assessments)
}

/// Load an answers file: a JSON object mapping question index to answer.
pub fn parse_answers(path: &Path) -> Result<Answers> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers JSON: {}", path.display()))
}

/// A warning from assessment validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn assessment(message: impl Into<String>) -> Self {
        Self {
            question_id: None,
            message: message.into(),
        }
    }

    fn question(q: &Question, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(q.id.clone()),
            message: message.into(),
        }
    }
}

/// Validate an assessment for common authoring issues.
pub fn validate_assessment(assessment: &Assessment) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if assessment.questions.is_empty() {
        warnings.push(ValidationWarning::assessment("assessment has no questions"));
    }
    if assessment.duration == 0 {
        warnings.push(ValidationWarning::assessment("duration is zero minutes"));
    }

    let mut seen_ids = HashSet::new();
    for q in &assessment.questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(ValidationWarning::question(
                q,
                format!("duplicate question ID: {}", q.id),
            ));
        }

        if q.prompt.trim().is_empty() {
            warnings.push(ValidationWarning::question(q, "prompt is empty"));
        }

        if q.points == 0 {
            warnings.push(ValidationWarning::question(q, "question is worth zero points"));
        }

        match q.kind {
            QuestionKind::MultipleChoice => {
                if q.options.len() < 2 {
                    warnings.push(ValidationWarning::question(
                        q,
                        "multiple-choice question needs at least two options",
                    ));
                }
                match &q.correct_answer {
                    Some(CorrectAnswer::Index(i)) if *i >= q.options.len() => {
                        warnings.push(ValidationWarning::question(
                            q,
                            format!("correct_answer {i} is out of range"),
                        ));
                    }
                    Some(CorrectAnswer::Index(_)) => {}
                    Some(CorrectAnswer::Text(_)) => warnings.push(ValidationWarning::question(
                        q,
                        "multiple-choice correct_answer must be an option index",
                    )),
                    None => warnings.push(ValidationWarning::question(
                        q,
                        "multiple-choice question has no correct_answer",
                    )),
                }
            }
            QuestionKind::ShortAnswer => {
                if !q.options.is_empty() {
                    warnings.push(ValidationWarning::question(
                        q,
                        "short-answer question has options that will be ignored",
                    ));
                }
                if matches!(q.correct_answer, Some(CorrectAnswer::Index(_))) {
                    warnings.push(ValidationWarning::question(
                        q,
                        "short-answer correct_answer should be text",
                    ));
                }
            }
        }
    }

    warnings
}

/// Check that answers fit the assessment they are meant for.
pub fn validate_answers(assessment: &Assessment, answers: &Answers) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    for (index, value) in answers {
        let Some(q) = assessment.questions.get(*index) else {
            warnings.push(ValidationWarning::assessment(format!(
                "answer for question {index} has no matching question"
            )));
            continue;
        };
        match (q.kind, value) {
            (QuestionKind::MultipleChoice, AnswerValue::Choice(i)) if *i >= q.options.len() => {
                warnings.push(ValidationWarning::question(
                    q,
                    format!("answer option {i} is out of range"),
                ));
            }
            (QuestionKind::MultipleChoice, AnswerValue::Text(_)) => {
                warnings.push(ValidationWarning::question(
                    q,
                    "multiple-choice answer should be an option index",
                ));
            }
            (QuestionKind::ShortAnswer, AnswerValue::Choice(_)) => {
                warnings.push(ValidationWarning::question(
                    q,
                    "short-answer answer should be text",
                ));
            }
            _ => {}
        }
    }
    warnings
}
