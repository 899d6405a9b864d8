//! Session runner.
//!
//! Owns an [`AssessmentSession`], drives its countdown from a tokio task, and
//! hands the answers to the backend exactly once, whether the taker submits
//! or the clock runs out.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use crate::error::SessionError;
use crate::model::{AnswerValue, Assessment, SubmitResponse};
use crate::session::{AssessmentSession, SessionPhase, SubmitTrigger, Tick};
use crate::timer::{spawn_countdown, CountdownGuard};
use crate::traits::AssessmentBackend;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Session event reporting trait.
pub trait SessionObserver: Send + Sync {
    fn on_tick(&self, remaining_secs: u64);
    fn on_expired(&self);
    fn on_submitted(&self, result: &SubmitResponse, trigger: SubmitTrigger);
    fn on_submit_error(&self, error: &str, trigger: SubmitTrigger);
}

/// No-op session observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_tick(&self, _: u64) {}
    fn on_expired(&self) {}
    fn on_submitted(&self, _: &SubmitResponse, _: SubmitTrigger) {}
    fn on_submit_error(&self, _: &str, _: SubmitTrigger) {}
}

struct Shared {
    session: Mutex<AssessmentSession>,
    backend: Arc<dyn AssessmentBackend>,
    observer: Arc<dyn SessionObserver>,
    phase_tx: watch::Sender<SessionPhase>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, AssessmentSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, phase: SessionPhase) {
        self.phase_tx.send_if_modified(|current| {
            let changed = *current != phase;
            *current = phase;
            changed
        });
    }

    async fn on_tick(&self) -> ControlFlow<()> {
        let (tick, phase) = {
            let mut session = self.lock();
            let tick = session.tick();
            (tick, session.phase())
        };

        match tick {
            Tick::Running(remaining) => {
                self.observer.on_tick(remaining);
                ControlFlow::Continue(())
            }
            Tick::Expired => {
                self.publish(phase);
                tracing::info!("time is up, submitting automatically");
                self.observer.on_tick(0);
                self.observer.on_expired();
                if let Err(e) = self.submit(SubmitTrigger::Expiry).await {
                    tracing::warn!("automatic submission did not go through: {e}");
                }
                ControlFlow::Break(())
            }
            Tick::Idle if phase.is_terminal() || phase == SessionPhase::Expired => {
                ControlFlow::Break(())
            }
            Tick::Idle => ControlFlow::Continue(()),
        }
    }

    async fn submit(&self, trigger: SubmitTrigger) -> Result<SubmitResponse, SessionError> {
        let ticket = {
            let mut session = self.lock();
            let ticket = session.begin_submission(trigger);
            self.publish(session.phase());
            ticket
        }?;

        tracing::info!(
            backend = self.backend.name(),
            assessment = %ticket.assessment_id,
            answered = ticket.answers.len(),
            %trigger,
            "submitting answers"
        );

        match self
            .backend
            .submit(&ticket.assessment_id, &ticket.answers)
            .await
        {
            Ok(response) => {
                {
                    let mut session = self.lock();
                    session.complete_submission(response);
                    self.publish(session.phase());
                }
                tracing::info!(
                    score = response.score,
                    total = response.total_questions,
                    "submission accepted"
                );
                self.observer.on_submitted(&response, trigger);
                Ok(response)
            }
            Err(e) => {
                {
                    let mut session = self.lock();
                    session.fail_submission();
                    self.publish(session.phase());
                }
                tracing::error!("submission failed: {e}");
                self.observer.on_submit_error(&e.to_string(), trigger);
                Err(e.into())
            }
        }
    }
}

/// A running, timed assessment session.
///
/// The countdown task lives exactly as long as the runner: it stops once the
/// answers are accepted, when the session is abandoned, or when the runner
/// is dropped.
pub struct SessionRunner {
    shared: Arc<Shared>,
    countdown: Mutex<Option<CountdownGuard>>,
}

impl SessionRunner {
    /// Start a session and its countdown. Must be called within a tokio runtime.
    pub fn start(
        assessment: Assessment,
        backend: Arc<dyn AssessmentBackend>,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, SessionError> {
        let session = AssessmentSession::new(assessment)?;
        tracing::info!(
            assessment = %session.assessment().id,
            questions = session.question_count(),
            seconds = session.remaining_secs(),
            "session started"
        );
        let (phase_tx, _) = watch::channel(session.phase());
        let shared = Arc::new(Shared {
            session: Mutex::new(session),
            backend,
            observer,
            phase_tx,
        });

        let ticker = Arc::clone(&shared);
        let countdown = spawn_countdown(TICK_PERIOD, move || {
            let shared = Arc::clone(&ticker);
            async move { shared.on_tick().await }
        });

        Ok(Self {
            shared,
            countdown: Mutex::new(Some(countdown)),
        })
    }

    /// Read the session state.
    pub fn with_session<R>(&self, f: impl FnOnce(&AssessmentSession) -> R) -> R {
        let session = self.shared.lock();
        f(&*session)
    }

    pub fn phase(&self) -> SessionPhase {
        self.shared.lock().phase()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.shared.lock().remaining_secs()
    }

    pub fn result(&self) -> Option<SubmitResponse> {
        self.shared.lock().result()
    }

    /// Watch phase changes, including those made by the countdown task.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.shared.phase_tx.subscribe()
    }

    pub fn next(&self) -> Result<bool, SessionError> {
        self.shared.lock().next()
    }

    pub fn previous(&self) -> Result<bool, SessionError> {
        self.shared.lock().previous()
    }

    pub fn go_to(&self, index: usize) -> Result<(), SessionError> {
        self.shared.lock().go_to(index)
    }

    pub fn select_answer(&self, value: AnswerValue) -> Result<(), SessionError> {
        self.shared.lock().select_answer(value)
    }

    pub fn clear_current_answer(&self) -> Result<Option<AnswerValue>, SessionError> {
        let mut session = self.shared.lock();
        let index = session.current_index();
        session.clear_answer(index)
    }

    /// Hand in the answers.
    ///
    /// Fails with [`SessionError::SubmissionInProgress`] without contacting
    /// the backend if an automatic submission is already in flight. On a
    /// backend failure the session reopens so the call can be repeated.
    pub async fn submit(&self) -> Result<SubmitResponse, SessionError> {
        let response = self.shared.submit(SubmitTrigger::Manual).await?;
        self.stop_countdown();
        Ok(response)
    }

    /// Walk away from the session without submitting.
    ///
    /// Fails with [`SessionError::SubmissionInProgress`] while answers are
    /// being handed in; wait for the phase to settle and try again.
    pub fn abandon(&self) -> Result<(), SessionError> {
        {
            let mut session = self.shared.lock();
            session.abandon()?;
            self.shared.publish(session.phase());
        }
        self.stop_countdown();
        tracing::info!("session abandoned");
        Ok(())
    }

    fn stop_countdown(&self) {
        let guard = self
            .countdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut guard) = guard {
            guard.cancel();
        }
    }
}
