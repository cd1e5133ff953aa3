//! ==============================================================================
//! main.rs - room monitor entry point
//! ==============================================================================
//!
//! purpose:
//!     samples temperature (and a synthetic humidity series) for every room,
//!     keeps a bounded rolling history, and shows it as a live dashboard that
//!     refreshes on a fixed countdown.
//!
//! responsibilities:
//!     - load configuration and install logging
//!     - open one sensor per room (failures are logged, never fatal)
//!     - serve the web dashboard
//!     - run the sample -> history -> render -> countdown loop
//!     - close every sensor on shutdown (ctrl-c / sigterm)
//!
//! architecture:
//!
//!     ┌─────────────────────────────────────────────────────────────┐
//!     │                    rust host (this file)                    │
//!     │  ┌──────────────────────┐        ┌──────────────────────┐   │
//!     │  │ refresh loop         │        │ web server           │   │
//!     │  │ (30s countdown)      │        │ (port 3000)          │   │
//!     │  └──────────┬───────────┘        └──────────┬───────────┘   │
//!     │             │ render / countdown            │ read          │
//!     │             └──────────────┬────────────────┘               │
//!     │                      ┌─────┴─────┐                          │
//!     │                      │ WebState  │ <- web.rs                │
//!     │                      └───────────┘                          │
//!     └─────────────────────────────────────────────────────────────┘
//!
//! ==============================================================================

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use room_monitor::config::DashboardConfig;
use room_monitor::dashboard::Dashboard;
use room_monitor::presentation::{ConsoleSink, FanoutSink};
use room_monitor::registry::SensorRegistry;
use room_monitor::sampling::{SamplingCycle, SyntheticHumidity};
use room_monitor::session::SessionStore;
use room_monitor::web::{self, WebSink};

// ==============================================================================
// main entry point
// ==============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  Room Monitor - Live Sensor Dashboard");
    println!("===========================================================");

    // step 1: load configuration (the log level lives in it)
    let (config, source) = DashboardConfig::load_or_default();

    // step 2: logging, then report where the config came from
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();
    source.log();
    config.validate().context("invalid configuration")?;
    config.print_summary();

    // step 3: open sensors
    let mut registry = SensorRegistry::simulated(&config)?;
    let summary = registry.open_all();
    tracing::info!("sensors open: {}/{}", summary.opened.len(), registry.len());

    // step 4: sinks (console always, web when enabled)
    let mut sink = FanoutSink::new().with(ConsoleSink::new(config.logging.show_sensor_data));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if config.server.enabled {
        let web = WebSink::new();
        let web_state = web.state();
        let bind = config.server.bind.clone();
        tokio::spawn(async move {
            if let Err(e) = web::run_server(web_state, &bind).await {
                tracing::error!("web server error: {:#}", e);
            }
        });
        sink = sink.with(web);
    }

    // step 5: shutdown signal
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    // step 6: refresh loop
    let acq = &config.acquisition;
    let humidity = SyntheticHumidity::new(acq.humidity_min..=acq.humidity_max);
    let mut dashboard = Dashboard::new(
        registry,
        SamplingCycle::new(Box::new(humidity)),
        SessionStore::new(config.history.max_entries),
        Arc::new(sink),
        config.refresh.interval_seconds,
    );

    tracing::info!(
        "starting refresh loop ({}s interval, {} readings kept)",
        config.refresh.interval_seconds,
        config.history.max_entries
    );
    dashboard.run(shutdown_rx).await;
    dashboard.shutdown();
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for sigterm: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
