//! ==============================================================================
//! dashboard.rs - the sample -> history -> render cycle
//! ==============================================================================
//!
//! purpose:
//!     runs one full page cycle and the refresh loop around it.
//!
//! ```text
//!     every cycle rebuilds the page from scratch: a new timestamp, a new
//!     sampling pass, a new view, a new countdown. the session store is the
//!     only thing carried from one cycle to the next.
//! ```
//!
//! data flow:
//!
//! ```text
//!     scheduler trigger -> SamplingCycle reads SensorRegistry
//!         -> readings appended to the session's RollingHistory
//!         -> DashboardView handed to the PresentationSink
//!         -> fresh RefreshScheduler counts down -> repeat
//! ```
//!
//! relationships:
//!     - used by: main.rs
//!     - uses: registry.rs, sampling.rs, session.rs, scheduler.rs, presentation.rs
//!
//! ==============================================================================

use crate::domain::now_ms;
use crate::presentation::{DashboardView, PresentationSink};
use crate::registry::SensorRegistry;
use crate::sampling::SamplingCycle;
use crate::scheduler::{Countdown, RefreshScheduler};
use crate::session::{SessionStore, DISPLAY_SESSION};

use std::sync::Arc;
use tokio::sync::watch;

pub struct Dashboard {
    registry: SensorRegistry,
    sampling: SamplingCycle,
    sessions: SessionStore,
    sink: Arc<dyn PresentationSink>,
    refresh_interval: u64,
    session_key: String,
    clock: fn() -> u64,
}

impl Dashboard {
    pub fn new(
        registry: SensorRegistry,
        sampling: SamplingCycle,
        sessions: SessionStore,
        sink: Arc<dyn PresentationSink>,
        refresh_interval: u64,
    ) -> Self {
        Self {
            registry,
            sampling,
            sessions,
            sink,
            refresh_interval,
            session_key: DISPLAY_SESSION.to_string(),
            clock: now_ms,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// one full page: sample every room, extend history, render
    ///
    /// a render failure is logged; the view is returned either way.
    pub async fn run_cycle(&mut self) -> DashboardView {
        let timestamp_ms = (self.clock)();
        let outcome = self.sampling.sample_all(&mut self.registry, timestamp_ms);
        debug_assert!(outcome.readings.iter().all(|r| self.registry.contains(&r.room)));

        let history = self.sessions.history_mut(&self.session_key);
        history.append_batch(outcome.readings.iter().cloned());

        let view = DashboardView {
            timestamp_ms,
            missing: outcome.missing_rooms(),
            current: outcome.readings,
            history: history.to_table(),
            refresh_interval: self.refresh_interval,
        };

        if let Err(e) = self.sink.render(&view).await {
            tracing::error!("render failed, continuing with next cycle: {:#}", e);
        }
        view
    }

    /// cycle, count down, repeat until shutdown; returns the number of cycles run
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut cycles = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }
            self.run_cycle().await;
            cycles += 1;

            let mut scheduler = RefreshScheduler::new(self.refresh_interval);
            match scheduler.run_countdown(self.sink.as_ref(), &mut shutdown).await {
                Countdown::Elapsed => continue,
                Countdown::Cancelled => break,
            }
        }
        tracing::info!("refresh loop stopped after {} cycles", cycles);
        cycles
    }

    /// close every sensor; logged, never fatal
    pub fn shutdown(&mut self) {
        tracing::info!("closing {} sensors", self.registry.len());
        self.registry.close_all();
    }
}
