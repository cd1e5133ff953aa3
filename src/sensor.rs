//! ==============================================================================
//! sensor.rs - instrument capability and lifecycle-managed sensor handles
//! ==============================================================================
//!
//! purpose:
//!     provides a unified interface for one acquisition channel.
//!     abstracts away the difference between a real instrument and the
//!     simulated one used on development machines.
//!
//! design:
//!     - `Instrument` is the raw capability: connect, disconnect, read.
//!     - `SensorHandle` owns one instrument and enforces the lifecycle:
//!       reads on an unopened handle fail, close is idempotent, and the
//!       instrument is released when the handle is dropped.
//!
//! relationships:
//!     - used by: registry.rs (one handle per room)
//!     - uses: error.rs (typed connection/acquisition failures)
//!
//! ==============================================================================

use crate::error::SensorError;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

pub trait Instrument: Send {
    fn connect(&mut self) -> Result<()>;
    fn disconnect(&mut self);
    fn read(&mut self) -> Result<f64>;
}

// ==============================================================================================
// SIMULATED INSTRUMENT (no hardware attached)
// ==============================================================================================

/// stand-in instrument producing uniform values in a fixed plausible range
pub struct SimulatedInstrument {
    range: RangeInclusive<f64>,
    refuse_connect: bool,
    connected: bool,
    rng: StdRng,
}

impl SimulatedInstrument {
    pub fn new(range: RangeInclusive<f64>) -> Self {
        Self {
            range,
            refuse_connect: false,
            connected: false,
            rng: StdRng::from_entropy(),
        }
    }

    /// an instrument that is never reachable
    pub fn unreachable(range: RangeInclusive<f64>) -> Self {
        Self { refuse_connect: true, ..Self::new(range) }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl Instrument for SimulatedInstrument {
    fn connect(&mut self) -> Result<()> {
        if self.refuse_connect {
            anyhow::bail!("instrument unreachable");
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn read(&mut self) -> Result<f64> {
        if !self.connected {
            anyhow::bail!("instrument not connected");
        }
        Ok(self.rng.gen_range(self.range.clone()))
    }
}

// ==============================================================================================
// SENSOR HANDLE
// ==============================================================================================

pub struct SensorHandle {
    id: String,
    is_open: bool,
    instrument: Box<dyn Instrument>,
}

impl SensorHandle {
    pub fn new(id: impl Into<String>, instrument: Box<dyn Instrument>) -> Self {
        Self { id: id.into(), is_open: false, instrument }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// open the handle, reporting the connection failure to the caller
    pub fn try_open(&mut self) -> Result<(), SensorError> {
        if self.is_open {
            return Ok(());
        }
        self.instrument.connect().map_err(|e| SensorError::Connection {
            sensor: self.id.clone(),
            reason: format!("{:#}", e),
        })?;
        self.is_open = true;
        Ok(())
    }

    /// best-effort open: a failure is logged and the handle stays closed
    pub fn open(&mut self) -> bool {
        match self.try_open() {
            Ok(()) => {
                tracing::debug!(sensor = %self.id, "sensor opened");
                true
            }
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }

    pub fn close(&mut self) {
        if self.is_open {
            self.instrument.disconnect();
            tracing::debug!(sensor = %self.id, "sensor closed");
        }
        self.is_open = false;
    }

    pub fn acquire_channel(&mut self) -> Result<f64, SensorError> {
        if !self.is_open {
            return Err(SensorError::NotOpen { sensor: self.id.clone() });
        }
        self.instrument.read().map_err(|e| SensorError::Acquisition {
            sensor: self.id.clone(),
            reason: format!("{:#}", e),
        })
    }
}

impl Drop for SensorHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SensorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorHandle")
            .field("id", &self.id)
            .field("is_open", &self.is_open)
            .finish()
    }
}

// ==============================================================================================
// TEST DOUBLES
// ==============================================================================================
#[cfg(test)]
pub(crate) mod testing {
    use super::Instrument;
    use anyhow::Result;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// instrument replaying a fixed script of reads
    ///
    /// `None` entries fail the read. once the script runs out the last
    /// successful value repeats.
    pub struct ScriptedInstrument {
        pub fail_connect: bool,
        script: VecDeque<Option<f64>>,
        last: f64,
        pub disconnects: Arc<AtomicUsize>,
    }

    impl ScriptedInstrument {
        pub fn new(script: impl IntoIterator<Item = Option<f64>>) -> Self {
            Self {
                fail_connect: false,
                script: script.into_iter().collect(),
                last: 0.0,
                disconnects: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn constant(value: f64) -> Self {
            Self::new([Some(value)])
        }

        pub fn refusing() -> Self {
            Self { fail_connect: true, ..Self::new([]) }
        }

        pub fn disconnect_counter(&self) -> Arc<AtomicUsize> {
            self.disconnects.clone()
        }
    }

    impl Instrument for ScriptedInstrument {
        fn connect(&mut self) -> Result<()> {
            if self.fail_connect {
                anyhow::bail!("connection refused");
            }
            Ok(())
        }

        fn disconnect(&mut self) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }

        fn read(&mut self) -> Result<f64> {
            match self.script.pop_front() {
                Some(Some(v)) => {
                    self.last = v;
                    Ok(v)
                }
                Some(None) => anyhow::bail!("read timed out"),
                None => Ok(self.last),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedInstrument;
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn simulated_values_stay_in_range() {
        let mut inst = SimulatedInstrument::new(20.0..=30.0).with_seed(7);
        inst.connect().unwrap();
        for _ in 0..200 {
            let v = inst.read().unwrap();
            assert!((20.0..=30.0).contains(&v), "{} out of range", v);
        }
    }

    #[test]
    fn acquire_on_unopened_handle_fails() {
        let mut handle = SensorHandle::new("Room 1", Box::new(ScriptedInstrument::constant(21.5)));
        assert_eq!(
            handle.acquire_channel(),
            Err(SensorError::NotOpen { sensor: "Room 1".into() })
        );
        assert!(handle.open());
        assert_eq!(handle.acquire_channel(), Ok(21.5));
    }

    #[test]
    fn failed_open_is_absorbed_and_handle_stays_closed() {
        let mut handle = SensorHandle::new("B", Box::new(ScriptedInstrument::refusing()));
        assert!(!handle.open());
        assert!(!handle.is_open());
        assert!(matches!(handle.try_open(), Err(SensorError::Connection { .. })));
        assert!(handle.acquire_channel().unwrap_err().is_acquisition());
    }

    #[test]
    fn read_failure_maps_to_acquisition_error() {
        let mut handle = SensorHandle::new("A", Box::new(ScriptedInstrument::new([None, Some(22.0)])));
        handle.open();
        let err = handle.acquire_channel().unwrap_err();
        assert!(matches!(err, SensorError::Acquisition { ref reason, .. } if reason.contains("timed out")));
        assert_eq!(handle.acquire_channel(), Ok(22.0));
    }

    #[test]
    fn close_is_idempotent() {
        let inst = ScriptedInstrument::constant(1.0);
        let disconnects = inst.disconnect_counter();
        let mut handle = SensorHandle::new("A", Box::new(inst));
        handle.open();
        handle.close();
        handle.close();
        assert!(!handle.is_open());
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_open_instrument() {
        let inst = ScriptedInstrument::constant(1.0);
        let disconnects = inst.disconnect_counter();
        {
            let mut handle = SensorHandle::new("A", Box::new(inst));
            handle.open();
        }
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_on_panic() {
        let inst = ScriptedInstrument::constant(1.0);
        let disconnects = inst.disconnect_counter();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let mut handle = SensorHandle::new("A", Box::new(inst));
            handle.open();
            panic!("render blew up");
        }));
        assert!(result.is_err());
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }
}
