//! ==============================================================================
//! sampling.rs - one reading per room per tick
//! ==============================================================================
//!
//! purpose:
//!     reads temperature from every registered sensor and pairs it with a
//!     humidity value from the secondary metric source. all readings of a
//!     cycle share the timestamp the caller supplies.
//!
//! failure policy:
//!     a room whose acquisition fails is skipped for this tick and reported
//!     in `CycleOutcome::failures`. every registered room ends up in exactly
//!     one of `readings` or `failures`; nothing is fabricated.
//!
//! relationships:
//!     - used by: dashboard.rs (one call per page cycle)
//!     - uses: registry.rs, sensor.rs
//!
//! ==============================================================================

use crate::domain::Reading;
use crate::error::SensorError;
use crate::registry::SensorRegistry;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

/// where the humidity column comes from
pub trait SecondaryMetricSource: Send {
    fn humidity(&mut self, room: &str) -> Result<f64>;
}

/// SYNTHETIC humidity: uniform random values, no sensor behind them
///
/// exists so the dashboard has a second series to plot; anything it
/// produces is illustrative only.
pub struct SyntheticHumidity {
    range: RangeInclusive<f64>,
    rng: StdRng,
}

impl SyntheticHumidity {
    pub fn new(range: RangeInclusive<f64>) -> Self {
        Self { range, rng: StdRng::from_entropy() }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl Default for SyntheticHumidity {
    fn default() -> Self {
        Self::new(40.0..=70.0)
    }
}

impl SecondaryMetricSource for SyntheticHumidity {
    fn humidity(&mut self, _room: &str) -> Result<f64> {
        Ok(self.rng.gen_range(self.range.clone()))
    }
}

/// everything one tick produced
#[derive(Debug, Default)]
pub struct CycleOutcome {
    pub timestamp_ms: u64,
    pub readings: Vec<Reading>,
    pub failures: Vec<SensorError>,
}

impl CycleOutcome {
    pub fn missing_rooms(&self) -> Vec<String> {
        self.failures.iter().map(|e| e.sensor().to_string()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct SamplingCycle {
    secondary: Box<dyn SecondaryMetricSource>,
}

impl SamplingCycle {
    pub fn new(secondary: Box<dyn SecondaryMetricSource>) -> Self {
        Self { secondary }
    }

    pub fn sample_all(&mut self, registry: &mut SensorRegistry, timestamp_ms: u64) -> CycleOutcome {
        let mut outcome = CycleOutcome { timestamp_ms, ..Default::default() };

        for handle in registry.handles_mut() {
            let temperature = match handle.acquire_channel() {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("skipping {} this tick: {}", handle.id(), e);
                    outcome.failures.push(e);
                    continue;
                }
            };
            let humidity = match self.secondary.humidity(handle.id()) {
                Ok(h) => h,
                Err(e) => {
                    let err = SensorError::Acquisition {
                        sensor: handle.id().to_string(),
                        reason: format!("humidity source: {:#}", e),
                    };
                    tracing::warn!("skipping {} this tick: {}", handle.id(), err);
                    outcome.failures.push(err);
                    continue;
                }
            };
            outcome.readings.push(Reading {
                timestamp_ms,
                room: handle.id().to_string(),
                temperature,
                humidity,
            });
        }

        outcome
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FailingFor, FixedHumidity};
    use super::*;
    use crate::sensor::testing::ScriptedInstrument;
    use crate::sensor::Instrument;
    use std::collections::HashSet;

    fn registry(rooms: Vec<(&str, ScriptedInstrument)>) -> SensorRegistry {
        let mut r = SensorRegistry::new(
            rooms
                .into_iter()
                .map(|(name, inst)| (name, Box::new(inst) as Box<dyn Instrument>)),
        )
        .unwrap();
        r.open_all();
        r
    }

    #[test]
    fn three_rooms_give_three_readings_with_shared_timestamp() {
        let mut reg = registry(vec![
            ("Room 1", ScriptedInstrument::constant(21.0)),
            ("Room 2", ScriptedInstrument::constant(22.0)),
            ("Room 3", ScriptedInstrument::constant(23.0)),
        ]);
        let mut cycle = SamplingCycle::new(Box::new(FixedHumidity(55.0)));
        let outcome = cycle.sample_all(&mut reg, 1_000);

        assert!(outcome.is_complete());
        assert_eq!(outcome.readings.len(), 3);
        assert!(outcome.readings.iter().all(|r| r.timestamp_ms == 1_000));

        let rooms: HashSet<&str> = outcome.readings.iter().map(|r| r.room.as_str()).collect();
        let keys: HashSet<&str> = reg.rooms().collect();
        assert_eq!(rooms, keys);

        let temps: Vec<f64> = outcome.readings.iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![21.0, 22.0, 23.0]);
        assert!(outcome.readings.iter().all(|r| r.humidity == 55.0));
    }

    #[test]
    fn unopened_room_is_excluded_and_reported() {
        let mut reg = registry(vec![
            ("A", ScriptedInstrument::constant(21.0)),
            ("B", ScriptedInstrument::refusing()),
            ("C", ScriptedInstrument::constant(23.0)),
        ]);
        let mut cycle = SamplingCycle::new(Box::new(FixedHumidity(50.0)));
        let outcome = cycle.sample_all(&mut reg, 5);

        let rooms: Vec<&str> = outcome.readings.iter().map(|r| r.room.as_str()).collect();
        assert_eq!(rooms, vec!["A", "C"]);
        assert_eq!(outcome.failures, vec![SensorError::NotOpen { sensor: "B".into() }]);
        assert_eq!(outcome.missing_rooms(), vec!["B"]);
    }

    #[test]
    fn failed_read_mid_cycle_does_not_stop_other_rooms() {
        let mut reg = registry(vec![
            ("A", ScriptedInstrument::new([None, Some(24.0)])),
            ("B", ScriptedInstrument::constant(22.0)),
        ]);
        let mut cycle = SamplingCycle::new(Box::new(FixedHumidity(50.0)));

        let first = cycle.sample_all(&mut reg, 1);
        assert_eq!(first.readings.len(), 1);
        assert_eq!(first.readings[0].room, "B");
        assert!(first.failures[0].is_acquisition());

        let second = cycle.sample_all(&mut reg, 2);
        assert!(second.is_complete());
        assert_eq!(second.readings[0].temperature, 24.0);
    }

    #[test]
    fn humidity_failure_is_reported_per_room() {
        let mut reg = registry(vec![
            ("A", ScriptedInstrument::constant(21.0)),
            ("B", ScriptedInstrument::constant(22.0)),
        ]);
        let mut cycle = SamplingCycle::new(Box::new(FailingFor("A".into())));
        let outcome = cycle.sample_all(&mut reg, 1);
        assert_eq!(outcome.readings.len(), 1);
        assert_eq!(outcome.missing_rooms(), vec!["A"]);
        // every room lands in exactly one list
        assert_eq!(outcome.readings.len() + outcome.failures.len(), reg.len());
    }

    #[test]
    fn synthetic_humidity_stays_in_range() {
        let mut source = SyntheticHumidity::default().with_seed(42);
        for _ in 0..200 {
            let h = source.humidity("Room 1").unwrap();
            assert!((40.0..=70.0).contains(&h));
        }
    }
}
