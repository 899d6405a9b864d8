//! Assessment session state machine.
//!
//! Tracks one taker's progress through an assessment: the current question,
//! the answers given so far, the countdown, and the submission guard. The
//! session is synchronous and owns no tasks; the runner in [`crate::engine`]
//! drives its clock and talks to the backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::model::{AnswerValue, Answers, Assessment, Question, QuestionKind, SubmitResponse};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    /// Answers and navigation are accepted; the clock is running.
    Active,
    /// Time ran out before a successful hand-in. Answers are frozen.
    Expired,
    /// A submission request is in flight.
    Submitting,
    /// The backend accepted the hand-in.
    Submitted,
    /// The taker walked away. Nothing is persisted.
    Abandoned,
}

impl SessionPhase {
    /// Whether answers may still change.
    pub fn is_open(&self) -> bool {
        matches!(self, SessionPhase::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Submitted | SessionPhase::Abandoned)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Active => write!(f, "active"),
            SessionPhase::Expired => write!(f, "expired"),
            SessionPhase::Submitting => write!(f, "submitting"),
            SessionPhase::Submitted => write!(f, "submitted"),
            SessionPhase::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// What started a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitTrigger {
    Manual,
    Expiry,
}

impl fmt::Display for SubmitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitTrigger::Manual => write!(f, "manual"),
            SubmitTrigger::Expiry => write!(f, "expiry"),
        }
    }
}

/// Result of advancing the clock by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still running with this many seconds left.
    Running(u64),
    /// The countdown reached zero on this tick. Reported exactly once.
    Expired,
    /// The session is not running; the tick had no effect.
    Idle,
}

/// Payload handed to the backend when a submission starts.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    /// Route identifier of the assessment.
    pub assessment_id: String,
    pub answers: Answers,
    pub trigger: SubmitTrigger,
}

/// One taker's in-progress attempt at an assessment.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    assessment: Assessment,
    current: usize,
    answers: Answers,
    remaining_secs: u64,
    phase: SessionPhase,
    result: Option<SubmitResponse>,
}

impl AssessmentSession {
    /// Start a session at the first question with the full time limit.
    pub fn new(assessment: Assessment) -> Result<Self, SessionError> {
        if assessment.questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }
        if assessment.duration == 0 {
            return Err(SessionError::NoDuration);
        }
        let remaining_secs = assessment.duration_secs();
        Ok(Self {
            assessment,
            current: 0,
            answers: Answers::new(),
            remaining_secs,
            phase: SessionPhase::Active,
            result: None,
        })
    }

    pub fn assessment(&self) -> &Assessment {
        &self.assessment
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// The backend's result, once submitted.
    pub fn result(&self) -> Option<SubmitResponse> {
        self.result
    }

    pub fn question_count(&self) -> usize {
        self.assessment.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.assessment.questions[self.current]
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.question_count()
    }

    /// Progress through the questions as a percentage, counting the current one.
    pub fn progress_percent(&self) -> f64 {
        (self.current + 1) as f64 / self.question_count() as f64 * 100.0
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn answer(&self, index: usize) -> Option<&AnswerValue> {
        self.answers.get(&index)
    }

    pub fn current_answer(&self) -> Option<&AnswerValue> {
        self.answer(self.current)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Move to the next question. Returns `false` (no-op) on the last one.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        self.ensure_open()?;
        if self.is_last() {
            return Ok(false);
        }
        self.current += 1;
        Ok(true)
    }

    /// Move to the previous question. Returns `false` (no-op) on the first one.
    pub fn previous(&mut self) -> Result<bool, SessionError> {
        self.ensure_open()?;
        if self.is_first() {
            return Ok(false);
        }
        self.current -= 1;
        Ok(true)
    }

    /// Jump to a question by index.
    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.check_index(index)?;
        self.current = index;
        Ok(())
    }

    /// Answer the current question. Never moves to another question.
    pub fn select_answer(&mut self, value: AnswerValue) -> Result<(), SessionError> {
        self.set_answer(self.current, value)
    }

    /// Answer the question at `index`, replacing any earlier answer.
    pub fn set_answer(&mut self, index: usize, value: AnswerValue) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.check_index(index)?;
        let question = &self.assessment.questions[index];
        match (question.kind, &value) {
            (QuestionKind::MultipleChoice, AnswerValue::Choice(option)) => {
                if *option >= question.options.len() {
                    return Err(SessionError::OptionOutOfRange {
                        index,
                        option: *option,
                        count: question.options.len(),
                    });
                }
            }
            (QuestionKind::ShortAnswer, AnswerValue::Text(_)) => {}
            (kind, _) => return Err(SessionError::AnswerKindMismatch { index, kind }),
        }
        self.answers.insert(index, value);
        Ok(())
    }

    /// Remove the answer to the question at `index`.
    pub fn clear_answer(&mut self, index: usize) -> Result<Option<AnswerValue>, SessionError> {
        self.ensure_open()?;
        self.check_index(index)?;
        Ok(self.answers.remove(&index))
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Tick {
        if self.phase != SessionPhase::Active {
            return Tick::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.phase = SessionPhase::Expired;
            return Tick::Expired;
        }
        Tick::Running(self.remaining_secs)
    }

    /// Claim the right to submit.
    ///
    /// Succeeds from `Active` or `Expired` and moves the session to
    /// `Submitting`, so at most one submission is in flight at a time.
    pub fn begin_submission(
        &mut self,
        trigger: SubmitTrigger,
    ) -> Result<SubmissionTicket, SessionError> {
        match self.phase {
            SessionPhase::Active | SessionPhase::Expired => {}
            SessionPhase::Submitting => return Err(SessionError::SubmissionInProgress),
            SessionPhase::Submitted => return Err(SessionError::AlreadySubmitted),
            SessionPhase::Abandoned => return Err(SessionError::Abandoned),
        }
        self.phase = SessionPhase::Submitting;
        Ok(SubmissionTicket {
            assessment_id: self.assessment.route_id().to_string(),
            answers: self.answers.clone(),
            trigger,
        })
    }

    /// Record the backend's result for the in-flight submission.
    pub fn complete_submission(&mut self, response: SubmitResponse) {
        if self.phase == SessionPhase::Submitting {
            self.phase = SessionPhase::Submitted;
            self.result = Some(response);
        }
    }

    /// Reopen the session after a failed submission so it can be retried.
    ///
    /// Returns to `Active` while time remains, otherwise to `Expired`.
    pub fn fail_submission(&mut self) {
        if self.phase == SessionPhase::Submitting {
            self.phase = if self.remaining_secs > 0 {
                SessionPhase::Active
            } else {
                SessionPhase::Expired
            };
        }
    }

    /// Walk away from the session. Partial answers are discarded.
    ///
    /// Refused while a submission is in flight or after one was accepted.
    pub fn abandon(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Active | SessionPhase::Expired => {
                self.phase = SessionPhase::Abandoned;
                self.answers.clear();
                Ok(())
            }
            SessionPhase::Abandoned => Ok(()),
            SessionPhase::Submitting => Err(SessionError::SubmissionInProgress),
            SessionPhase::Submitted => Err(SessionError::AlreadySubmitted),
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.phase.is_open() {
            Ok(())
        } else {
            Err(SessionError::Closed(self.phase))
        }
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        if index < self.question_count() {
            Ok(())
        } else {
            Err(SessionError::QuestionOutOfRange {
                index,
                count: self.question_count(),
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::CorrectAnswer;

    pub(crate) fn sample_assessment(duration: u32) -> Assessment {
        let mc = |id: &str, correct: usize| Question {
            id: id.into(),
            kind: QuestionKind::MultipleChoice,
            prompt: format!("Pick for {id}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: Some(CorrectAnswer::Index(correct)),
            points: 1,
        };
        Assessment {
            id: "assessment:sample".into(),
            title: "Sample".into(),
            description: String::new(),
            category: "General".into(),
            duration,
            questions: vec![
                mc("q1", 1),
                mc("q2", 0),
                Question {
                    id: "q3".into(),
                    kind: QuestionKind::ShortAnswer,
                    prompt: "Explain".into(),
                    options: vec![],
                    correct_answer: None,
                    points: 2,
                },
            ],
        }
    }

    #[test]
    fn starts_at_first_question_with_full_clock() {
        let session = AssessmentSession::new(sample_assessment(2)).unwrap();
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.remaining_secs(), 120);
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn rejects_empty_or_untimed_assessments() {
        let mut empty = sample_assessment(1);
        empty.questions.clear();
        assert!(matches!(
            AssessmentSession::new(empty),
            Err(SessionError::NoQuestions)
        ));
        assert!(matches!(
            AssessmentSession::new(sample_assessment(0)),
            Err(SessionError::NoDuration)
        ));
    }

    #[test]
    fn navigation_is_bounded() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        assert!(!session.previous().unwrap());
        assert_eq!(session.current_index(), 0);

        assert!(session.next().unwrap());
        assert!(session.next().unwrap());
        assert!(session.is_last());
        assert!(!session.next().unwrap());
        assert_eq!(session.current_index(), 2);

        assert!(matches!(
            session.go_to(3),
            Err(SessionError::QuestionOutOfRange { index: 3, count: 3 })
        ));
        session.go_to(1).unwrap();
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn answering_does_not_advance() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        session.select_answer(AnswerValue::Choice(2)).unwrap();
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.current_answer(), Some(&AnswerValue::Choice(2)));
    }

    #[test]
    fn answers_survive_backtracking() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        session.select_answer(AnswerValue::Choice(1)).unwrap();
        session.next().unwrap();
        session.select_answer(AnswerValue::Choice(0)).unwrap();
        session.previous().unwrap();
        assert_eq!(session.current_answer(), Some(&AnswerValue::Choice(1)));
        assert_eq!(session.answered_count(), 2);
    }

    #[test]
    fn answer_validation() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        assert!(matches!(
            session.select_answer(AnswerValue::Choice(3)),
            Err(SessionError::OptionOutOfRange { option: 3, .. })
        ));
        assert!(matches!(
            session.select_answer(AnswerValue::Text("b".into())),
            Err(SessionError::AnswerKindMismatch {
                kind: QuestionKind::MultipleChoice,
                ..
            })
        ));
        assert!(matches!(
            session.set_answer(2, AnswerValue::Choice(0)),
            Err(SessionError::AnswerKindMismatch { index: 2, .. })
        ));
        session
            .set_answer(2, AnswerValue::Text("because".into()))
            .unwrap();
        assert_eq!(
            session.clear_answer(2).unwrap(),
            Some(AnswerValue::Text("because".into()))
        );
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn progress_counts_current_question() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        assert!((session.progress_percent() - 100.0 / 3.0).abs() < 1e-9);
        session.go_to(2).unwrap();
        assert!((session.progress_percent() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn countdown_expires_exactly_once() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        let mut expirations = 0;
        for _ in 0..120 {
            if session.tick() == Tick::Expired {
                expirations += 1;
            }
        }
        assert_eq!(expirations, 1);
        assert_eq!(session.remaining_secs(), 0);
        assert_eq!(session.phase(), SessionPhase::Expired);
        assert_eq!(session.tick(), Tick::Idle);
    }

    #[test]
    fn expired_session_rejects_answers() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        while session.tick() != Tick::Expired {}
        assert!(matches!(
            session.select_answer(AnswerValue::Choice(0)),
            Err(SessionError::Closed(SessionPhase::Expired))
        ));
        assert!(matches!(
            session.next(),
            Err(SessionError::Closed(SessionPhase::Expired))
        ));
    }

    #[test]
    fn submission_guard_admits_one_request() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        session.select_answer(AnswerValue::Choice(1)).unwrap();

        let ticket = session.begin_submission(SubmitTrigger::Manual).unwrap();
        assert_eq!(ticket.assessment_id, "sample");
        assert_eq!(ticket.answers.len(), 1);

        assert!(matches!(
            session.begin_submission(SubmitTrigger::Expiry),
            Err(SessionError::SubmissionInProgress)
        ));
        assert_eq!(session.tick(), Tick::Idle);

        session.complete_submission(SubmitResponse {
            score: 1,
            total_questions: 3,
        });
        assert_eq!(session.phase(), SessionPhase::Submitted);
        assert!(matches!(
            session.begin_submission(SubmitTrigger::Manual),
            Err(SessionError::AlreadySubmitted)
        ));
        assert!(matches!(
            session.select_answer(AnswerValue::Choice(0)),
            Err(SessionError::Closed(SessionPhase::Submitted))
        ));
    }

    #[test]
    fn failed_submission_reopens_session() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        session.select_answer(AnswerValue::Choice(1)).unwrap();
        session.begin_submission(SubmitTrigger::Manual).unwrap();
        session.fail_submission();
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.current_answer(), Some(&AnswerValue::Choice(1)));
        session.select_answer(AnswerValue::Choice(2)).unwrap();
    }

    #[test]
    fn failed_expiry_submission_stays_expired_but_retryable() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        while session.tick() != Tick::Expired {}
        session.begin_submission(SubmitTrigger::Expiry).unwrap();
        session.fail_submission();
        assert_eq!(session.phase(), SessionPhase::Expired);
        assert!(session.begin_submission(SubmitTrigger::Manual).is_ok());
    }

    #[test]
    fn abandon_discards_answers() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        session.select_answer(AnswerValue::Choice(1)).unwrap();
        session.abandon().unwrap();
        assert_eq!(session.phase(), SessionPhase::Abandoned);
        assert_eq!(session.answered_count(), 0);
        assert!(matches!(
            session.begin_submission(SubmitTrigger::Manual),
            Err(SessionError::Abandoned)
        ));
    }

    #[test]
    fn abandon_refused_while_submitting() {
        let mut session = AssessmentSession::new(sample_assessment(1)).unwrap();
        session.select_answer(AnswerValue::Choice(1)).unwrap();
        session.begin_submission(SubmitTrigger::Manual).unwrap();
        assert!(matches!(
            session.abandon(),
            Err(SessionError::SubmissionInProgress)
        ));

        session.complete_submission(SubmitResponse {
            score: 1,
            total_questions: 3,
        });
        assert_eq!(session.phase(), SessionPhase::Submitted);
        assert!(session.result().is_some());
        assert!(matches!(session.abandon(), Err(SessionError::AlreadySubmitted)));
    }
}
