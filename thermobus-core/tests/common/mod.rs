//! Common test utilities for integration tests
//!
//! Provides a scripted bus driver with fault injection and a hook set that
//! counts every notification, so tests can assert on exact firing behavior.

#![allow(dead_code)]

use thermobus_core::{BusFault, CycleHooks, SensorId, SensorSample, TemperatureBus};

/// Conversion time at 12-bit resolution, halving per dropped bit
pub const CONVERSION_MS_12BIT: u32 = 750;

/// Scripted bus driver
///
/// Yields a fixed list of scan entries each cycle and can inject faults at
/// the trigger and persist call sites. Resolution corrections are recorded
/// rather than applied, so tests can assert on exactly what was written.
pub struct MockBus {
    /// Entries yielded by one scan pass, in order
    pub samples: Vec<Result<SensorSample, BusFault>>,
    /// Fault injected on the next `trigger_conversion` call
    pub trigger_fault: Option<BusFault>,
    /// Fault injected on every `persist_cache` call
    pub persist_fault: Option<BusFault>,
    /// Power-up placeholder this bus reports
    pub sentinel_c: f32,

    /// Every `(id, bits)` staged via `cache_resolution_bits`
    pub cached: Vec<(SensorId, u8)>,
    /// Number of `persist_cache` calls observed
    pub persist_calls: usize,
    /// Number of `trigger_conversion` calls observed
    pub trigger_calls: usize,

    cursor: usize,
}

impl MockBus {
    pub fn new(samples: Vec<Result<SensorSample, BusFault>>) -> Self {
        Self {
            samples,
            trigger_fault: None,
            persist_fault: None,
            sentinel_c: -0.05,
            cached: Vec::new(),
            persist_calls: 0,
            trigger_calls: 0,
            cursor: 0,
        }
    }

    /// Convenience: a bus of plain 12-bit readings
    pub fn with_readings(readings: &[(SensorId, f32)]) -> Self {
        Self::new(readings.iter().map(|(id, t)| ok_sample(*id, *t, 12)).collect())
    }
}

impl TemperatureBus for MockBus {
    fn trigger_conversion(&mut self) -> Result<(), BusFault> {
        self.trigger_calls += 1;
        match self.trigger_fault {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn start_scan(&mut self) {
        self.cursor = 0;
    }

    fn next_sensor(&mut self) -> Option<Result<SensorSample, BusFault>> {
        let entry = self.samples.get(self.cursor).cloned();
        self.cursor += 1;
        entry
    }

    fn cache_resolution_bits(&mut self, id: SensorId, bits: u8) {
        self.cached.push((id, bits));
    }

    fn persist_cache(&mut self, _id: SensorId) -> Result<(), BusFault> {
        self.persist_calls += 1;
        match self.persist_fault {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn power_up_sentinel_c(&self) -> f32 {
        self.sentinel_c
    }

    fn min_conversion_ms(&self, bits: u8) -> u32 {
        // Conversion time halves for every bit of resolution given up
        CONVERSION_MS_12BIT >> (12u32.saturating_sub(u32::from(bits)))
    }
}

/// Hook set that counts every notification
#[derive(Debug, Default)]
pub struct CountingHooks {
    pub success: u32,
    pub failure: u32,
    pub resolution_changes: u32,
    pub count_changes: u32,
}

impl CycleHooks for CountingHooks {
    fn on_success(&mut self) {
        self.success += 1;
    }

    fn on_failure(&mut self) {
        self.failure += 1;
    }

    fn on_resolution_change(&mut self) {
        self.resolution_changes += 1;
    }

    fn on_sensor_count_change(&mut self) {
        self.count_changes += 1;
    }
}

/// A valid scan entry
pub fn ok_sample(id: SensorId, temperature_c: f32, bits: u8) -> Result<SensorSample, BusFault> {
    Ok(SensorSample {
        id,
        temperature_c,
        resolution_bits: bits,
    })
}
