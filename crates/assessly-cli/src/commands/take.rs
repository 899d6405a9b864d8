//! The `assessly take` command: an interactive, timed session on stdin.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};

use assessly_core::engine::{SessionObserver, SessionRunner};
use assessly_core::error::SessionError;
use assessly_core::model::{AnswerValue, QuestionKind, SubmitResponse};
use assessly_core::result::{format_remaining, ResultSummary};
use assessly_core::session::{SessionPhase, SubmitTrigger};

use super::open_backend;

const HELP: &str =
    "Commands: n next | p previous | g N go to | a VALUE answer | c clear | s submit | q quit";

/// Console session observer.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_tick(&self, remaining_secs: u64) {
        if remaining_secs > 0
            && (remaining_secs % 60 == 0 || remaining_secs == 30 || remaining_secs == 10)
        {
            println!("  [time left {}]", format_remaining(remaining_secs));
        }
    }

    fn on_expired(&self) {
        println!("\nTime is up. Submitting your answers...");
    }

    fn on_submitted(&self, result: &SubmitResponse, _trigger: SubmitTrigger) {
        let summary = ResultSummary::from(*result);
        println!("\nAssessment submitted.");
        println!("Score: {summary} [{}]", summary.band());
    }

    fn on_submit_error(&self, error: &str, trigger: SubmitTrigger) {
        match trigger {
            SubmitTrigger::Manual => println!("Submission failed: {error}"),
            SubmitTrigger::Expiry => println!(
                "Automatic submission failed: {error}. Your answers are kept; type 's' to retry."
            ),
        }
    }
}

enum Step {
    Continue,
    Done,
}

pub async fn execute(assessment_id: String, config_path: Option<PathBuf>) -> Result<()> {
    let backend = open_backend(config_path.as_deref())?;
    let assessment = backend
        .fetch_assessment(&assessment_id)
        .await
        .with_context(|| format!("failed to load assessment {assessment_id}"))?;

    println!("{}", assessment.title);
    if !assessment.description.is_empty() {
        println!("{}", assessment.description);
    }
    println!(
        "{} questions, {} minutes. The clock starts now.",
        assessment.questions.len(),
        assessment.duration
    );
    println!("{HELP}\n");

    let runner = SessionRunner::start(assessment, backend, Arc::new(ConsoleObserver))?;
    let mut phases = runner.subscribe();
    let mut lines = spawn_stdin_reader();

    print_question(&runner);
    loop {
        tokio::select! {
            changed = phases.changed() => {
                if changed.is_err() {
                    break;
                }
                let phase = *phases.borrow_and_update();
                if phase.is_terminal() {
                    break;
                }
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    input_closed(&runner, &mut phases).await;
                    break;
                };
                match handle(&runner, line.trim()).await {
                    Step::Continue => {}
                    Step::Done => break,
                }
            }
        }
    }

    Ok(())
}

async fn handle(runner: &SessionRunner, input: &str) -> Step {
    let (cmd, arg) = match input.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (input, ""),
    };

    let outcome = match cmd {
        "" => return Step::Continue,
        "n" => runner.next().map(|moved| {
            if !moved {
                println!("Already at the last question.");
            }
        }),
        "p" => runner.previous().map(|moved| {
            if !moved {
                println!("Already at the first question.");
            }
        }),
        "g" => match arg.parse::<usize>() {
            Ok(n) if n >= 1 => runner.go_to(n - 1),
            _ => {
                println!("Usage: g N (question number, starting at 1)");
                return Step::Continue;
            }
        },
        "a" => match parse_answer(runner, arg) {
            Some(value) => runner.select_answer(value),
            None => return Step::Continue,
        },
        "c" => runner.clear_current_answer().map(|_| ()),
        "s" => {
            return match runner.submit().await {
                Ok(_) => Step::Done,
                // The failure itself is reported by the observer.
                Err(SessionError::Backend(e)) if e.is_permanent() => {
                    if runner.abandon().is_ok() {
                        println!("This submission cannot go through. Session abandoned.");
                    }
                    Step::Done
                }
                Err(SessionError::Backend(_)) => {
                    println!("Type 's' to retry.");
                    Step::Continue
                }
                Err(SessionError::AlreadySubmitted) => Step::Done,
                Err(e) => {
                    println!("{e}");
                    Step::Continue
                }
            };
        }
        "q" => {
            return match runner.abandon() {
                Ok(()) => {
                    println!("Session abandoned; no answers were submitted.");
                    Step::Done
                }
                Err(e) => {
                    println!("{e}");
                    Step::Continue
                }
            };
        }
        "h" | "?" => {
            println!("{HELP}");
            return Step::Continue;
        }
        other => {
            println!("Unknown command '{other}'. {HELP}");
            return Step::Continue;
        }
    };

    match outcome {
        Ok(()) => print_question(runner),
        Err(e) => println!("{e}"),
    }
    Step::Continue
}

/// Let an in-flight hand-in settle, then walk away if nothing was submitted.
async fn input_closed(runner: &SessionRunner, phases: &mut watch::Receiver<SessionPhase>) {
    // Errors only once the runner's sender is gone.
    let _ = phases.wait_for(|p| *p != SessionPhase::Submitting).await;
    if runner.abandon().is_ok() {
        println!("Input closed. Session abandoned; no answers were submitted.");
    }
}

/// Multiple-choice answers are 1-based option numbers; anything else is text.
fn parse_answer(runner: &SessionRunner, arg: &str) -> Option<AnswerValue> {
    if arg.is_empty() {
        println!("Usage: a VALUE");
        return None;
    }
    let kind = runner.with_session(|s| s.current_question().kind);
    match kind {
        QuestionKind::MultipleChoice => match arg.parse::<usize>() {
            Ok(n) if n >= 1 => Some(AnswerValue::Choice(n - 1)),
            _ => {
                println!("Answer with an option number, starting at 1.");
                None
            }
        },
        QuestionKind::ShortAnswer => Some(AnswerValue::Text(arg.to_string())),
    }
}

fn print_question(runner: &SessionRunner) {
    runner.with_session(|s| {
        let question = s.current_question();
        println!(
            "Question {} of {} ({} answered, {:.0}%)  time left {}",
            s.current_index() + 1,
            s.question_count(),
            s.answered_count(),
            s.progress_percent(),
            format_remaining(s.remaining_secs())
        );
        println!("{}", question.prompt);
        match question.kind {
            QuestionKind::MultipleChoice => {
                for (i, option) in question.options.iter().enumerate() {
                    let marker = match s.current_answer() {
                        Some(AnswerValue::Choice(c)) if *c == i => " *",
                        _ => "",
                    };
                    println!("  {}) {option}{marker}", i + 1);
                }
            }
            QuestionKind::ShortAnswer => match s.current_answer() {
                Some(answer) => println!("  Your answer: {answer}"),
                None => println!("  (type: a your answer)"),
            },
        }
    });
}

/// Read stdin lines on a plain thread so a pending read never holds up
/// runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
