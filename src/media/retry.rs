use std::time::Duration;

use crate::config::BackoffConfig;
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::media::clock::Clock;
use crate::media::handle::{MediaHandle, ReadyState};

/// Exponential poll schedule with a bounded number of attempts.
#[derive(Clone, Debug)]
pub struct Backoff {
    cfg: BackoffConfig,
    next: Duration,
    attempts: u32,
}

impl Backoff {
    /// Fresh schedule for `cfg`.
    pub fn new(cfg: &BackoffConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            next: Duration::from_millis(cfg.initial_delay_ms),
            attempts: 0,
        }
    }

    /// Attempts consumed so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before the next poll, or `None` once attempts are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.cfg.max_attempts {
            return None;
        }
        self.attempts += 1;
        let d = self.next;
        let grown = self.next.as_secs_f64() * self.cfg.factor.max(1.0);
        let max = Duration::from_millis(self.cfg.max_delay_ms);
        // Overflowing or non-finite growth saturates at the cap.
        self.next = Duration::try_from_secs_f64(grown).map_or(max, |d| d.min(max));
        Some(d.min(max))
    }

    /// Restart the schedule from the initial delay.
    pub fn reset(&mut self) {
        self.next = Duration::from_millis(self.cfg.initial_delay_ms);
        self.attempts = 0;
    }
}

/// Readiness of one node's handle, as tracked across host ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// No wait in progress.
    Idle,
    /// Waiting for the handle to buffer; re-polled at `next_poll`.
    AwaitingReady {
        /// Poll attempts made so far.
        attempt: u32,
        /// Clock time of the next poll.
        next_poll: Duration,
    },
    /// The handle reached the required ready state.
    Ready,
}

/// Non-blocking readiness tracker driven once per host tick.
#[derive(Clone, Debug)]
pub(crate) struct ReadinessGate {
    state: Readiness,
    backoff: Backoff,
}

impl ReadinessGate {
    pub(crate) fn new(cfg: &BackoffConfig) -> Self {
        Self {
            state: Readiness::Idle,
            backoff: Backoff::new(cfg),
        }
    }

    pub(crate) fn state(&self) -> Readiness {
        self.state
    }

    /// Forget any wait in progress (e.g. after the handle changed).
    pub(crate) fn reset(&mut self) {
        self.state = Readiness::Idle;
        self.backoff.reset();
    }

    /// Poll `handle` once. Returns `Ok(true)` when ready, `Ok(false)` while still waiting, and a
    /// timeout error once the backoff schedule is exhausted.
    pub(crate) fn poll<H: MediaHandle + ?Sized>(
        &mut self,
        handle: &H,
        min: ReadyState,
        now: Duration,
    ) -> ScenecastResult<bool> {
        if is_ready(handle, min) {
            self.state = Readiness::Ready;
            self.backoff.reset();
            return Ok(true);
        }

        match self.state {
            Readiness::AwaitingReady { next_poll, .. } if now < next_poll => Ok(false),
            Readiness::AwaitingReady { .. } | Readiness::Idle | Readiness::Ready => {
                match self.backoff.next_delay() {
                    Some(d) => {
                        self.state = Readiness::AwaitingReady {
                            attempt: self.backoff.attempts(),
                            next_poll: now + d,
                        };
                        Ok(false)
                    }
                    None => {
                        let attempts = self.backoff.attempts();
                        self.reset();
                        Err(ScenecastError::timeout(format!(
                            "'{}' not ready after {attempts} polls",
                            handle.src()
                        )))
                    }
                }
            }
        }
    }
}

pub(crate) fn is_ready<H: MediaHandle + ?Sized>(handle: &H, min: ReadyState) -> bool {
    handle.ready_state() >= min && !handle.is_seeking()
}

/// Block until `handle` reaches `min` and has no seek in flight.
///
/// Polls on the `backoff` schedule (holding at the maximum delay once it is exhausted) and
/// fails with a timeout after `timeout`, or with a media error as soon as the handle reports one.
pub fn wait_until_ready<H: MediaHandle + ?Sized>(
    handle: &H,
    min: ReadyState,
    clock: &dyn Clock,
    backoff: &BackoffConfig,
    timeout: Duration,
) -> ScenecastResult<()> {
    let start = clock.now();
    let mut schedule = Backoff::new(backoff);
    let max_delay = Duration::from_millis(backoff.max_delay_ms.max(1));
    loop {
        if let Some(code) = handle.error() {
            return Err(ScenecastError::media(format!(
                "'{}': {}",
                handle.src(),
                code.describe()
            )));
        }
        if is_ready(handle, min) {
            return Ok(());
        }
        let elapsed = clock.now().saturating_sub(start);
        if elapsed >= timeout {
            return Err(ScenecastError::timeout(format!(
                "'{}' not ready after {:.3}s (state {:?})",
                handle.src(),
                elapsed.as_secs_f64(),
                handle.ready_state()
            )));
        }
        let delay = schedule
            .next_delay()
            .unwrap_or(max_delay)
            .max(Duration::from_millis(1))
            .min(timeout - elapsed);
        clock.sleep(delay);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/retry.rs"]
mod tests;
