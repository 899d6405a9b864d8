//! Cancellable countdown task.
//!
//! The countdown is a tokio task owned by a [`CountdownGuard`]. Dropping or
//! cancelling the guard aborts the task, so no tick can fire after the
//! owning session is gone.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Owns a running countdown task and aborts it when released.
#[derive(Debug)]
pub struct CountdownGuard {
    handle: Option<JoinHandle<()>>,
}

impl CountdownGuard {
    /// Stop the countdown. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("countdown cancelled");
        }
    }

    /// Whether the task has stopped, either on its own or by cancellation.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }
}

impl Drop for CountdownGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a task that calls `on_tick` once per `period`, starting one period
/// from now, until it returns [`ControlFlow::Break`].
///
/// Must be called from within a tokio runtime.
pub fn spawn_countdown<F, Fut>(period: Duration, mut on_tick: F) -> CountdownGuard
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ControlFlow<()>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        loop {
            interval.tick().await;
            if on_tick().await.is_break() {
                break;
            }
        }
    });
    CountdownGuard {
        handle: Some(handle),
    }
}
