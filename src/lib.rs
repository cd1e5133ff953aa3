//! # room-monitor
//! ## Live room sensor dashboard with a bounded rolling history
//!
//! Features:
//! - One lifecycle-managed sensor handle per room
//! - Per-tick sampling with skip-and-report on acquisition failures
//! - Fixed-capacity FIFO history per display session
//! - Cancellable refresh countdown
//! - Console and web (html + json) presentation sinks

pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod history;
pub mod presentation;
pub mod registry;
pub mod sampling;
pub mod scheduler;
pub mod sensor;
pub mod session;
pub mod web;
