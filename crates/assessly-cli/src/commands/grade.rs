//! The `assessly grade` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use assessly_core::model::{Assessment, CorrectAnswer, Question};
use assessly_core::parser;
use assessly_core::result::ResultSummary;
use assessly_core::scoring::{score_answers, ScoreOutcome, ShortAnswerPolicy, Verdict};

pub fn execute(assessment_path: PathBuf, answers_path: PathBuf, short_answer: String) -> Result<()> {
    let policy: ShortAnswerPolicy = short_answer.parse().map_err(anyhow::Error::msg)?;
    let assessment = parser::parse_assessment(&assessment_path)?;
    let answers = parser::parse_answers(&answers_path)?;

    for w in parser::validate_answers(&assessment, &answers) {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("[{id}] "))
            .unwrap_or_default();
        eprintln!("Warning: {prefix}{}", w.message);
    }

    let outcome = score_answers(&assessment.questions, &answers, policy);
    print_marks(&assessment, &answers, &outcome);

    let summary = ResultSummary::from(outcome.response());
    println!("Score: {summary} [{}]", summary.band());
    println!(
        "Points: {}/{}",
        outcome.points_earned, outcome.points_possible
    );
    if outcome.pending_review > 0 {
        println!(
            "{} short answer(s) pending manual review (policy: {policy})",
            outcome.pending_review
        );
    }

    Ok(())
}

fn print_marks(
    assessment: &Assessment,
    answers: &assessly_core::model::Answers,
    outcome: &ScoreOutcome,
) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Answer", "Expected", "Result", "Points"]);

    for mark in &outcome.marks {
        let question = &assessment.questions[mark.index];
        let answer = answers
            .get(&mark.index)
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(mark.index),
            Cell::new(&mark.question_id),
            Cell::new(answer),
            Cell::new(expected(question)),
            Cell::new(verdict_label(mark.verdict)),
            Cell::new(format!("{}/{}", mark.points_awarded, question.points)),
        ]);
    }

    println!("{table}");
}

fn expected(question: &Question) -> String {
    match &question.correct_answer {
        Some(CorrectAnswer::Index(i)) => match question.options.get(*i) {
            Some(option) => format!("{i} ({option})"),
            None => i.to_string(),
        },
        Some(CorrectAnswer::Text(text)) => text.clone(),
        None => "-".to_string(),
    }
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Correct => "correct",
        Verdict::Incorrect => "incorrect",
        Verdict::Unanswered => "unanswered",
        Verdict::PendingReview => "pending review",
    }
}
