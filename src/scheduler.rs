//! ==============================================================================
//! scheduler.rs - refresh countdown
//! ==============================================================================
//!
//! purpose:
//!     counts down the refresh interval one second at a time, reporting each
//!     step to the presentation sink, and signals when a new cycle is due.
//!
//! state machine:
//!
//! ```text
//!     CountingDown(n) -> CountingDown(n-1) -> ... -> CountingDown(0) -> Trigger
//! ```
//!
//! ```text
//!     every CountingDown(n > 0) step is followed by a one second wait. the
//!     wait races the shutdown signal so ctrl-c never sits out the interval.
//! ```
//!
//! relationships:
//!     - used by: dashboard.rs (one scheduler per page cycle)
//!     - uses: presentation.rs (countdown display)
//!
//! ==============================================================================

use crate::presentation::PresentationSink;

use std::time::Duration;
use tokio::sync::watch;

pub const DEFAULT_REFRESH_INTERVAL: u64 = 30;

const STEP: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    CountingDown(u64),
    Trigger,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// show `n` seconds remaining, then wait one step
    Countdown(u64),
    /// interval elapsed; run a full cycle
    Trigger,
}

/// how a countdown ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Countdown {
    Elapsed,
    Cancelled,
}

#[derive(Debug)]
pub struct RefreshScheduler {
    interval: u64,
    state: SchedulerState,
}

impl RefreshScheduler {
    pub fn new(interval_secs: u64) -> Self {
        Self { interval: interval_secs, state: SchedulerState::CountingDown(interval_secs) }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// advance the state machine by one transition
    ///
    /// once triggered the scheduler stays in `Trigger`; a new cycle starts
    /// with a fresh scheduler.
    pub fn step(&mut self) -> SchedulerEvent {
        match self.state {
            SchedulerState::CountingDown(0) | SchedulerState::Trigger => {
                self.state = SchedulerState::Trigger;
                SchedulerEvent::Trigger
            }
            SchedulerState::CountingDown(n) => {
                self.state = SchedulerState::CountingDown(n - 1);
                SchedulerEvent::Countdown(n)
            }
        }
    }

    /// run the countdown to `Trigger`, or until shutdown is requested
    pub async fn run_countdown(
        &mut self,
        sink: &dyn PresentationSink,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Countdown {
        loop {
            if *shutdown.borrow() {
                return Countdown::Cancelled;
            }
            match self.step() {
                SchedulerEvent::Trigger => return Countdown::Elapsed,
                SchedulerEvent::Countdown(remaining) => {
                    sink.countdown(remaining).await;
                    tokio::select! {
                        _ = tokio::time::sleep(STEP) => {}
                        _ = shutdown.changed() => {
                            tracing::debug!("countdown cancelled with {}s remaining", remaining);
                            return Countdown::Cancelled;
                        }
                    }
                }
            }
        }
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}
