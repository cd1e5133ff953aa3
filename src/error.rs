//! ==============================================================================
//! error.rs - sensor error kinds
//! ==============================================================================
//!
//! purpose:
//!     typed failures for the sensor layer. everything above the sensor layer
//!     (config, web server, rendering) stays on `anyhow`.
//!
//! relationships:
//!     - produced by: sensor.rs (open/acquire), registry.rs (construction)
//!     - consumed by: sampling.rs (skip-and-report policy), web.rs (missing tiles)
//!
//! ==============================================================================

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    /// the instrument refused the connection; the handle stays unopened
    #[error("failed to connect to sensor '{sensor}': {reason}")]
    Connection { sensor: String, reason: String },

    /// the instrument was open but the read itself failed
    #[error("failed to acquire reading from sensor '{sensor}': {reason}")]
    Acquisition { sensor: String, reason: String },

    /// acquisition attempted on a handle that never opened (or was closed)
    #[error("sensor '{sensor}' is not open")]
    NotOpen { sensor: String },

    #[error("room '{0}' is registered twice")]
    DuplicateRoom(String),
}

impl SensorError {
    /// true for every failure that happens while reading a value
    pub fn is_acquisition(&self) -> bool {
        matches!(self, Self::Acquisition { .. } | Self::NotOpen { .. })
    }

    /// the sensor (room) this error belongs to
    pub fn sensor(&self) -> &str {
        match self {
            Self::Connection { sensor, .. }
            | Self::Acquisition { sensor, .. }
            | Self::NotOpen { sensor } => sensor,
            Self::DuplicateRoom(room) => room,
        }
    }
}
