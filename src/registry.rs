//! ==============================================================================
//! registry.rs - one sensor handle per room
//! ==============================================================================
//!
//! purpose:
//!     fixed, ordered mapping `room -> SensorHandle`, built once at startup.
//!     owns the handles, so closing the registry (or dropping it on any exit
//!     path) releases every instrument.
//!
//! relationships:
//!     - used by: main.rs (open at startup, close at shutdown)
//!     - used by: sampling.rs (iterates rooms in registration order)
//!     - uses: sensor.rs
//!
//! ==============================================================================

use crate::config::DashboardConfig;
use crate::error::SensorError;
use crate::sensor::{Instrument, SensorHandle, SimulatedInstrument};

#[derive(Debug, Default)]
pub struct SensorRegistry {
    handles: Vec<SensorHandle>,
}

/// result of `open_all`: which rooms came up and which did not
#[derive(Debug, Default, PartialEq)]
pub struct OpenSummary {
    pub opened: Vec<String>,
    pub failed: Vec<String>,
}

impl SensorRegistry {
    pub fn new<I, S>(entries: I) -> Result<Self, SensorError>
    where
        I: IntoIterator<Item = (S, Box<dyn Instrument>)>,
        S: Into<String>,
    {
        let mut handles: Vec<SensorHandle> = Vec::new();
        for (room, instrument) in entries {
            let room = room.into();
            if handles.iter().any(|h| h.id() == room) {
                return Err(SensorError::DuplicateRoom(room));
            }
            handles.push(SensorHandle::new(room, instrument));
        }
        Ok(Self { handles })
    }

    /// simulated instruments for every configured room
    pub fn simulated(config: &DashboardConfig) -> Result<Self, SensorError> {
        let acq = &config.acquisition;
        let range = acq.temperature_min..=acq.temperature_max;
        Self::new(config.rooms.names.iter().map(|room| {
            let instrument: Box<dyn Instrument> = if config.rooms.fail_open.contains(room) {
                Box::new(SimulatedInstrument::unreachable(range.clone()))
            } else {
                Box::new(SimulatedInstrument::new(range.clone()))
            };
            (room.clone(), instrument)
        }))
    }

    /// open every handle; a failing room is logged and skipped
    pub fn open_all(&mut self) -> OpenSummary {
        let mut summary = OpenSummary::default();
        for handle in &mut self.handles {
            if handle.open() {
                summary.opened.push(handle.id().to_string());
            } else {
                summary.failed.push(handle.id().to_string());
            }
        }
        if !summary.failed.is_empty() {
            tracing::warn!(
                "{} of {} sensors failed to open: {}",
                summary.failed.len(),
                self.handles.len(),
                summary.failed.join(", ")
            );
        }
        summary
    }

    pub fn close_all(&mut self) {
        for handle in &mut self.handles {
            handle.close();
        }
    }

    /// room names in registration order
    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.handles.iter().map(|h| h.id())
    }

    /// rooms whose handle is currently open
    pub fn open_rooms(&self) -> Vec<&str> {
        self.handles.iter().filter(|h| h.is_open()).map(|h| h.id()).collect()
    }

    pub fn contains(&self, room: &str) -> bool {
        self.handles.iter().any(|h| h.id() == room)
    }

    pub fn get_mut(&mut self, room: &str) -> Option<&mut SensorHandle> {
        self.handles.iter_mut().find(|h| h.id() == room)
    }

    pub fn handles_mut(&mut self) -> impl Iterator<Item = &mut SensorHandle> {
        self.handles.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for SensorRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}
