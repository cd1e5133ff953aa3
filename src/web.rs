//! ==============================================================================
//! web.rs - browser dashboard
//! ==============================================================================
//!
//! purpose:
//!     the web presentation sink. each rendered cycle is stored in shared
//!     state; the http handlers turn it into a page or json.
//!
//! routes:
//!     - GET /             html: metric tiles + temperature/humidity trend charts
//!     - GET /api          json: the latest full view
//!     - GET /api/history  json: history table only
//!     - GET /api/status   json: liveness summary (rooms reporting, countdown)
//!
//! page layout:
//!
//! ```text
//!     ┌───────────────────────────────────────────────────┐
//!     │ Current Sensor Readings                           │
//!     │  [Room 1 °C / %]   [Room 2 °C / %]   [Room 3 ...] │
//!     ├───────────────────────────────────────────────────┤
//!     │ Trends                                            │
//!     │  [Temperature Over Time]  [Humidity Over Time]    │
//!     ├───────────────────────────────────────────────────┤
//!     │ ⏳ Refreshing in N seconds...                     │
//!     └───────────────────────────────────────────────────┘
//! ```
//!
//! ```text
//!     the page reloads itself when the countdown runs out (meta refresh).
//! ```
//!
//! relationships:
//!     - implements: presentation.rs (PresentationSink)
//!     - used by: main.rs (server task + sink registration)
//!
//! ==============================================================================

use crate::domain::{HistoryTable, Metric};
use crate::presentation::{DashboardView, PresentationSink};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use axum::{
    extract::State,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

// ==============================================================================
// shared state
// ==============================================================================
// written by the refresh loop through WebSink, read by the http handlers.

#[derive(Clone, Default, Serialize)]
pub struct WebState {
    /// last rendered cycle, None until the first cycle completes
    pub view: Option<DashboardView>,
    /// seconds until the next cycle
    pub next_refresh_in: u64,
}

pub type SharedWebState = Arc<RwLock<WebState>>;

#[derive(Clone, Default)]
pub struct WebSink {
    state: SharedWebState,
}

impl WebSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SharedWebState {
        self.state.clone()
    }
}

#[async_trait]
impl PresentationSink for WebSink {
    async fn render(&self, view: &DashboardView) -> Result<()> {
        let mut guard = self.state.write().await;
        guard.view = Some(view.clone());
        guard.next_refresh_in = view.refresh_interval;
        Ok(())
    }

    async fn countdown(&self, remaining_secs: u64) {
        self.state.write().await.next_refresh_in = remaining_secs;
    }
}

// ==============================================================================
// web server
// ==============================================================================

pub fn router(state: SharedWebState) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api", get(api_handler))
        .route("/api/history", get(history_handler))
        .route("/api/status", get(status_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(state: SharedWebState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    tracing::info!("dashboard live at http://{}", bind);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn dashboard_handler(State(state): State<SharedWebState>) -> Html<String> {
    let state = state.read().await;
    Html(render_page(&state))
}

/// json api endpoint for programmatic access
async fn api_handler(State(state): State<SharedWebState>) -> Json<WebState> {
    let state = state.read().await;
    Json(state.clone())
}

async fn history_handler(State(state): State<SharedWebState>) -> Json<HistoryTable> {
    let state = state.read().await;
    Json(state.view.as_ref().map(|v| v.history.clone()).unwrap_or_default())
}

/// small health payload for scripts and uptime checks
async fn status_handler(State(state): State<SharedWebState>) -> Json<serde_json::Value> {
    let state = state.read().await;
    match &state.view {
        None => Json(serde_json::json!({"status": "starting", "next_refresh_in": state.next_refresh_in})),
        Some(view) => {
            let status = if view.missing.is_empty() { "ok" } else { "degraded" };
            let reporting: Vec<&str> = view.current.iter().map(|r| r.room.as_str()).collect();
            Json(serde_json::json!({
                "status": status,
                "last_cycle_ms": view.timestamp_ms,
                "reporting": reporting,
                "missing": view.missing,
                "history_len": view.history.len(),
                "next_refresh_in": state.next_refresh_in,
            }))
        }
    }
}

// ==============================================================================
// html rendering
// ==============================================================================

const PALETTE: [&str; 8] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692", "#b6e880",
];

const CHART_W: f64 = 560.0;
const CHART_H: f64 = 400.0;
const MARGIN: f64 = 48.0;

pub fn render_page(state: &WebState) -> String {
    // reload one second after the countdown runs out
    let reload = state.next_refresh_in.max(1) + 1;
    let mut body = String::new();

    match &state.view {
        None => body.push_str("<p class=\"muted\">Waiting for the first sampling cycle...</p>"),
        Some(view) => {
            body.push_str("<h2>📡 Current Sensor Readings</h2>\n<div class=\"tiles\">\n");
            for r in &view.current {
                let room = html_escape(&r.room);
                let _ = write!(
                    body,
                    "<div class=\"tile\"><div class=\"label\">{room} Temperature (°C)</div>\
                     <div class=\"value\">{:.2}</div>\
                     <div class=\"label\">{room} Humidity (%)</div>\
                     <div class=\"value\">{:.2}</div></div>\n",
                    r.temperature, r.humidity
                );
            }
            for room in &view.missing {
                let _ = write!(
                    body,
                    "<div class=\"tile stale\"><div class=\"label\">{}</div>\
                     <div class=\"value\">no data</div></div>\n",
                    html_escape(room)
                );
            }
            body.push_str("</div>\n<h2>📊 Trends</h2>\n<div class=\"charts\">\n");
            body.push_str(&render_chart(&view.history, Metric::Temperature, "Temperature Over Time"));
            body.push_str(&render_chart(&view.history, Metric::Humidity, "Humidity Over Time"));
            body.push_str("</div>\n");
        }
    }

    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{reload}">
<title>Lab Dashboard</title>
<style>
body {{ font-family: system-ui; margin: 0 auto; padding: 0 1rem; max-width: 1200px; background: #1a1a2e; color: #eee; }}
h2 {{ margin: 0.8rem 0 0.4rem; }}
.tiles {{ display: flex; gap: 1rem; }}
.tile {{ flex: 1; background: #16213e; border-radius: 8px; padding: 0.6rem 1rem; }}
.tile.stale {{ opacity: 0.5; }}
.label {{ font-size: 0.85rem; color: #aaa; }}
.value {{ font-size: 1.6rem; margin-bottom: 0.3rem; }}
.charts {{ display: flex; gap: 1rem; }}
.charts svg {{ flex: 1; background: #16213e; border-radius: 8px; }}
.muted {{ color: #888; }}
</style>
</head>
<body>
{body}<p id="countdown">⏳ Refreshing in <b>{remaining} seconds</b>...</p>
</body>
</html>"#,
        remaining = state.next_refresh_in,
    )
}

/// one svg line chart: a polyline with markers per room
pub fn render_chart(table: &HistoryTable, metric: Metric, title: &str) -> String {
    let mut svg = format!(
        "<svg viewBox=\"0 0 {CHART_W} {CHART_H}\" role=\"img\" aria-label=\"{t}\">\
         <text x=\"{MARGIN}\" y=\"24\" fill=\"#eee\" font-size=\"16\">{t}</text>",
        t = html_escape(title)
    );

    let points: Vec<(u64, f64)> = table.rows.iter().map(|r| (r.time, metric.of(r))).collect();
    if points.is_empty() {
        svg.push_str("</svg>\n");
        return svg;
    }

    let (t0, t1) = span(points.iter().map(|p| p.0 as f64));
    let (v0, v1) = span(points.iter().map(|p| p.1));
    let pad = (v1 - v0) * 0.05;
    let (v0, v1) = (v0 - pad, v1 + pad);

    let x = |t: u64| MARGIN + (t as f64 - t0) / (t1 - t0) * (CHART_W - 2.0 * MARGIN);
    let y = |v: f64| CHART_H - MARGIN - (v - v0) / (v1 - v0) * (CHART_H - 2.0 * MARGIN);

    // axes and range labels
    let _ = write!(
        svg,
        "<g stroke=\"#555\"><line x1=\"{m}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\"/>\
         <line x1=\"{m}\" y1=\"{m}\" x2=\"{m}\" y2=\"{b}\"/></g>\
         <g fill=\"#aaa\" font-size=\"11\">\
         <text x=\"4\" y=\"{m}\">{:.1}</text><text x=\"4\" y=\"{b}\">{:.1}</text>\
         <text x=\"{m}\" y=\"{tb}\">{}</text>\
         <text x=\"{r}\" y=\"{tb}\" text-anchor=\"end\">{}</text></g>",
        v1,
        v0,
        clock_label(t0 as u64),
        clock_label(t1 as u64),
        m = MARGIN,
        b = CHART_H - MARGIN,
        r = CHART_W - MARGIN,
        tb = CHART_H - MARGIN + 16.0,
    );

    for (i, room) in table.rooms().into_iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let series = table.series(room, metric);
        let coords: Vec<String> =
            series.iter().map(|&(t, v)| format!("{:.1},{:.1}", x(t), y(v))).collect();
        let _ = write!(
            svg,
            "<g data-room=\"{name}\"><polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"2\" points=\"{}\"/>",
            coords.join(" "),
            name = html_escape(room),
        );
        for &(t, v) in &series {
            let _ = write!(svg, "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{color}\"/>", x(t), y(v));
        }
        let _ = write!(
            svg,
            "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"{color}\" font-size=\"12\">{}</text></g>",
            CHART_W - MARGIN - 80.0,
            24.0 + 14.0 * i as f64,
            html_escape(room)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// min/max of a series, widened when every value is the same
fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if hi - lo < f64::EPSILON {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    }
}

/// HH:MM:SS in local time for a millisecond timestamp
fn clock_label(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// escape html special characters to prevent xss
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
