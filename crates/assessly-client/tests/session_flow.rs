//! End-to-end session flows against the mock backend.

use std::sync::Arc;
use std::time::Duration;

use assessly_client::{BackendError, MockBackend};
use assessly_core::catalog::AssessmentCatalog;
use assessly_core::engine::{NoopObserver, SessionRunner};
use assessly_core::error::SessionError;
use assessly_core::model::{AnswerValue, Assessment, CorrectAnswer, Question, QuestionKind};
use assessly_core::result::{ResultSummary, ScoreBand};
use assessly_core::session::SessionPhase;

fn mc(id: &str, correct: usize) -> Question {
    Question {
        id: id.into(),
        kind: QuestionKind::MultipleChoice,
        prompt: format!("Question {id}"),
        options: vec!["a".into(), "b".into(), "c".into()],
        correct_answer: Some(CorrectAnswer::Index(correct)),
        points: 1,
    }
}

fn quiz(duration: u32) -> Assessment {
    Assessment {
        id: "assessment:quiz".into(),
        title: "Quiz".into(),
        description: "Three questions".into(),
        category: "General".into(),
        duration,
        questions: vec![mc("q1", 1), mc("q2", 0), mc("q3", 2)],
    }
}

#[tokio::test(start_paused = true)]
async fn take_and_submit_manually() {
    let mock = Arc::new(MockBackend::new(vec![quiz(5)]));
    let mut catalog = AssessmentCatalog::new();
    catalog.refresh(mock.as_ref()).await.unwrap();
    let assessment = catalog.get("quiz").unwrap().clone();

    let runner = SessionRunner::start(assessment, mock.clone(), Arc::new(NoopObserver)).unwrap();
    runner.select_answer(AnswerValue::Choice(1)).unwrap();
    runner.next().unwrap();
    runner.select_answer(AnswerValue::Choice(0)).unwrap();
    runner.next().unwrap();
    runner.select_answer(AnswerValue::Choice(1)).unwrap();

    let result = runner.submit().await.unwrap();
    let summary = ResultSummary::from(result);
    assert_eq!(summary.to_string(), "2/3 (67%)");
    assert_eq!(summary.band(), ScoreBand::Yellow);
    assert_eq!(runner.phase(), SessionPhase::Submitted);
    assert_eq!(mock.submit_count(), 1);

    // Clock is stopped after submission.
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(mock.submit_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn expiry_submits_current_answers() {
    let mock = Arc::new(MockBackend::new(vec![quiz(1)]));
    let runner = SessionRunner::start(quiz(1), mock.clone(), Arc::new(NoopObserver)).unwrap();
    let mut phases = runner.subscribe();

    runner.select_answer(AnswerValue::Choice(1)).unwrap();

    tokio::time::sleep(Duration::from_millis(60_500)).await;
    assert_eq!(runner.phase(), SessionPhase::Submitted);
    assert_eq!(mock.submit_count(), 1);
    assert_eq!(
        mock.last_answers().unwrap().get(&0),
        Some(&AnswerValue::Choice(1))
    );
    assert_eq!(runner.result().unwrap().score, 1);
    assert!(phases.has_changed().unwrap());
    assert_eq!(*phases.borrow_and_update(), SessionPhase::Submitted);

    assert!(matches!(
        runner.submit().await,
        Err(SessionError::AlreadySubmitted)
    ));
    assert_eq!(mock.submit_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_submission_can_be_retried() {
    let mock = Arc::new(MockBackend::new(vec![quiz(5)]));
    mock.fail_next_submit(BackendError::Network("connection reset".into()));
    let runner = SessionRunner::start(quiz(5), mock.clone(), Arc::new(NoopObserver)).unwrap();

    let err = runner.submit().await.unwrap_err();
    assert!(matches!(err, SessionError::Backend(BackendError::Network(_))));
    assert_eq!(runner.phase(), SessionPhase::Active);

    runner.select_answer(AnswerValue::Choice(1)).unwrap();
    let result = runner.submit().await.unwrap();
    assert_eq!(result.score, 1);
    assert_eq!(mock.submit_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn manual_submit_during_slow_expiry_is_refused() {
    let mock = Arc::new(MockBackend::new(vec![quiz(1)]).with_submit_delay(Duration::from_secs(5)));
    let runner = SessionRunner::start(quiz(1), mock.clone(), Arc::new(NoopObserver)).unwrap();

    tokio::time::sleep(Duration::from_millis(61_000)).await;
    assert_eq!(runner.phase(), SessionPhase::Submitting);
    assert!(matches!(
        runner.submit().await,
        Err(SessionError::SubmissionInProgress)
    ));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(runner.phase(), SessionPhase::Submitted);
    assert_eq!(mock.submit_count(), 1);
}
