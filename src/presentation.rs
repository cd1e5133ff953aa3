//! ==============================================================================
//! presentation.rs - where a finished cycle goes
//! ==============================================================================
//!
//! purpose:
//!     the sink contract for rendering: current readings for the metric tiles
//!     and the full history table for the two trend charts. also receives
//!     countdown updates between cycles.
//!
//! relationships:
//!     - used by: dashboard.rs (render), scheduler.rs (countdown)
//!     - implemented by: ConsoleSink, FanoutSink (here), WebSink (web.rs)
//!
//! ==============================================================================

use crate::domain::{HistoryTable, Reading};

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// everything a sink needs to draw one page
#[derive(Clone, Debug, Default, Serialize)]
pub struct DashboardView {
    /// shared timestamp of the cycle (ms)
    pub timestamp_ms: u64,
    /// this cycle's readings, registry order
    pub current: Vec<Reading>,
    /// rooms that produced no reading this cycle
    pub missing: Vec<String>,
    pub history: HistoryTable,
    pub refresh_interval: u64,
}

#[async_trait]
pub trait PresentationSink: Send + Sync {
    async fn render(&self, view: &DashboardView) -> Result<()>;

    async fn countdown(&self, _remaining_secs: u64) {}
}

#[async_trait]
impl<S: PresentationSink + ?Sized> PresentationSink for Arc<S> {
    async fn render(&self, view: &DashboardView) -> Result<()> {
        (**self).render(view).await
    }

    async fn countdown(&self, remaining_secs: u64) {
        (**self).countdown(remaining_secs).await
    }
}

// ==============================================================================
// console sink
// ==============================================================================

/// writes metrics and countdown through `tracing`
pub struct ConsoleSink {
    show_sensor_data: bool,
}

impl ConsoleSink {
    pub fn new(show_sensor_data: bool) -> Self {
        Self { show_sensor_data }
    }
}

/// one metric line per room, two decimals
pub fn metric_line(reading: &Reading) -> String {
    format!(
        "{} Temperature (°C) {:.2} | Humidity (%) {:.2}",
        reading.room, reading.temperature, reading.humidity
    )
}

#[async_trait]
impl PresentationSink for ConsoleSink {
    async fn render(&self, view: &DashboardView) -> Result<()> {
        if self.show_sensor_data {
            for r in &view.current {
                tracing::info!("{}", metric_line(r));
            }
            for room in &view.missing {
                tracing::info!("{} no data this cycle", room);
            }
        }
        tracing::debug!("history holds {} readings", view.history.len());
        Ok(())
    }

    async fn countdown(&self, remaining_secs: u64) {
        tracing::debug!("Refreshing in {} seconds...", remaining_secs);
    }
}

// ==============================================================================
// fan-out
// ==============================================================================

/// forwards to every inner sink; a failing sink does not starve the rest
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn PresentationSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl PresentationSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl PresentationSink for FanoutSink {
    async fn render(&self, view: &DashboardView) -> Result<()> {
        let mut failed = 0;
        for sink in &self.sinks {
            if let Err(e) = sink.render(view).await {
                tracing::error!("sink render failed: {:#}", e);
                failed += 1;
            }
        }
        if failed > 0 {
            anyhow::bail!("{} of {} sinks failed to render", failed, self.sinks.len());
        }
        Ok(())
    }

    async fn countdown(&self, remaining_secs: u64) {
        for sink in &self.sinks {
            sink.countdown(remaining_secs).await;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    fn view() -> DashboardView {
        DashboardView {
            timestamp_ms: 1,
            current: vec![Reading {
                timestamp_ms: 1,
                room: "Room 1".into(),
                temperature: 23.456,
                humidity: 55.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn metric_line_uses_two_decimals() {
        assert_eq!(
            metric_line(&view().current[0]),
            "Room 1 Temperature (°C) 23.46 | Humidity (%) 55.00"
        );
    }

    #[tokio::test]
    async fn fanout_keeps_rendering_after_a_failure() {
        let bad = Arc::new(RecordingSink::failing());
        let good = Arc::new(RecordingSink::default());
        let fanout = FanoutSink::new().with(bad.clone()).with(good.clone());

        assert!(fanout.render(&view()).await.is_err());
        assert_eq!(bad.renders(), 1);
        assert_eq!(good.renders(), 1);
    }

    #[tokio::test]
    async fn fanout_forwards_countdown() {
        let a = Arc::new(RecordingSink::default());
        let fanout = FanoutSink::new().with(a.clone()).with(ConsoleSink::new(false));
        fanout.countdown(3).await;
        fanout.countdown(2).await;
        assert_eq!(a.countdown_log(), vec![3, 2]);
        assert_eq!(fanout.len(), 2);
    }

    #[tokio::test]
    async fn console_sink_never_fails() {
        let sink = ConsoleSink::new(true);
        assert!(sink.render(&view()).await.is_ok());
    }
}
