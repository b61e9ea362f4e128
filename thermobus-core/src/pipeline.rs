//! Acquisition-and-Aggregation Pipeline
//!
//! ## Overview
//!
//! This module drives the whole measurement cycle: one pass over every sensor
//! on the bus, validity filtering, resolution correction, averaging,
//! exponential smoothing, and the statistics update.
//!
//! ```text
//! trigger → scan ┬ filter ─ accumulate sum / ids / count
//!                └ resolution sync ─ on_resolution_change
//!         ↓
//! average → smooth → statistics → hooks (count change, success/failure)
//! ```
//!
//! ## Cycle Semantics
//!
//! - A driver fault while triggering, reading a sensor, or persisting a
//!   resolution correction aborts the cycle. Partial accumulation is
//!   discarded, not partially reported, and statistics stay untouched.
//! - A filtered-out reading is *not* a fault - it just excludes that sensor
//!   from the average. The cycle only fails when zero sensors contribute,
//!   and then the raw value is the configured range minimum rather than
//!   anything uninitialized.
//! - Statistics fold in the *smoothed* value, and only on success.
//!
//! ## Concurrency
//!
//! Single-threaded and non-reentrant by contract. `run_cycle()` blocks the
//! caller for the conversion window plus the scan; there is no internal
//! locking, so invoke the pipeline from one control loop only.
//!
//! ## Pacing
//!
//! [`ThermoPipeline::poll`] gates cycles behind the configured period using
//! the `nb` convention: `Err(nb::Error::WouldBlock)` until a cycle is due.
//! The period can never be set below the bus's minimum conversion time.

use heapless::{FnvIndexMap, Vec};

use crate::{
    errors::{Outcome, ThermoError},
    filter::ReadingFilter,
    resolution::ResolutionConfig,
    smoothing::ExponentialSmoother,
    stats::StatisticsTracker,
    time::{CycleGate, TimeSource, Timestamp},
    traits::{CycleHooks, NoHooks, SensorId, TemperatureBus},
};

/// Capacity of the per-cycle id list and the id→temperature map.
///
/// Buses larger than this still average every valid reading; only the id
/// list and the temperature map cap out at the first `MAX_SENSORS`
/// contributors.
pub const MAX_SENSORS: usize = 16;

/// Default measurement period between cycles
pub const DEFAULT_PERIOD_MS: u32 = 1000;

/// Default smoothing factor
pub const DEFAULT_ALPHA: f32 = 0.2;

/// Default valid range, matching common one-wire sensor operating limits
pub const DEFAULT_RANGE_C: (f32, f32) = (-55.0, 125.0);

// Optional logging for cycle failures
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

/// Result of one measurement cycle, replaced every cycle
#[derive(Debug, Clone)]
pub struct CycleResult {
    /// Raw (unsmoothed) average of the contributing readings, or the range
    /// minimum when nothing contributed
    pub raw_average_c: f32,

    /// Exact number of readings classified valid this cycle
    pub count: usize,

    /// Identifiers of the contributing sensors, in scan order
    pub ids: Vec<SensorId, MAX_SENSORS>,

    /// Translated outcome of the cycle
    pub outcome: Outcome,
}

impl CycleResult {
    fn empty(raw_average_c: f32, outcome: Outcome) -> Self {
        Self {
            raw_average_c,
            count: 0,
            ids: Vec::new(),
            outcome,
        }
    }
}

/// Accumulator for one scan pass; dropped wholesale when the pass aborts
#[derive(Default)]
struct ScanTotals {
    sum_c: f32,
    count: usize,
    ids: Vec<SensorId, MAX_SENSORS>,
    temps: Vec<(SensorId, f32), MAX_SENSORS>,
}

/// The acquisition-and-aggregation pipeline
///
/// Owns the bus driver, the clock, the filter/resolution configuration, and
/// all cross-cycle state (smoother, statistics, last cycle result). Built
/// via [`ThermoPipeline::builder`].
pub struct ThermoPipeline<B, T, H = NoHooks> {
    bus: B,
    clock: T,
    hooks: H,

    filter: ReadingFilter,
    resolution: ResolutionConfig,
    gate: CycleGate,

    smoother: ExponentialSmoother,
    stats: StatisticsTracker,

    /// Result of the most recent cycle attempt
    last: CycleResult,
    /// Owned map of each contributing sensor's last-seen temperature
    temps: FnvIndexMap<SensorId, f32, MAX_SENSORS>,
    /// Contributing count of the previous *completed* scan
    last_scan_count: usize,
    last_outcome: Outcome,
}

impl<B: TemperatureBus, T: TimeSource> ThermoPipeline<B, T, NoHooks> {
    /// Start building a pipeline around a bus driver and a clock
    pub fn builder(bus: B, clock: T) -> PipelineBuilder<B, T, NoHooks> {
        PipelineBuilder {
            bus,
            clock,
            hooks: NoHooks,
            min_c: DEFAULT_RANGE_C.0,
            max_c: DEFAULT_RANGE_C.1,
            alpha: DEFAULT_ALPHA,
            bits: crate::resolution::RESOLUTION_MAX_BITS,
            period_ms: DEFAULT_PERIOD_MS,
        }
    }
}

impl<B, T, H> ThermoPipeline<B, T, H>
where
    B: TemperatureBus,
    T: TimeSource,
    H: CycleHooks,
{
    /// Run one full measurement cycle immediately, ignoring the period gate.
    ///
    /// Blocks for the conversion window and the scan. See the module docs
    /// for the exact semantics of faults, filtering, and hook ordering.
    pub fn run_cycle(&mut self) -> Outcome {
        let outcome = match self.scan() {
            Ok(totals) => self.finish_scan(totals),
            Err(fault) => {
                // Aborted mid-scan: partials are discarded, the previous
                // cycle's data must not linger as if it were current.
                self.last = CycleResult::empty(self.filter.min_sentinel_c(), Err(fault));
                Err(fault)
            }
        };

        self.last_outcome = outcome;
        match outcome {
            Ok(()) => self.hooks.on_success(),
            Err(_) => {
                log_warn!("measurement cycle failed: {:?}", self.last_outcome);
                self.hooks.on_failure();
            }
        }
        outcome
    }

    /// Run a cycle if one is due, otherwise report `WouldBlock`.
    ///
    /// Call this from the control loop; it arms the period gate and
    /// delegates to [`run_cycle`](Self::run_cycle) when the period has
    /// elapsed.
    pub fn poll(&mut self) -> nb::Result<(), ThermoError> {
        let now = self.clock.now();
        if !self.gate.is_due(now) {
            return Err(nb::Error::WouldBlock);
        }

        self.gate.arm(now);
        self.run_cycle().map_err(nb::Error::Other)
    }

    /// One pass over the bus. `Err` means the pass aborted.
    fn scan(&mut self) -> Result<ScanTotals, ThermoError> {
        self.bus
            .trigger_conversion()
            .map_err(ThermoError::from_fault)?;

        let mut totals = ScanTotals::default();
        self.bus.start_scan();

        while let Some(entry) = self.bus.next_sensor() {
            let sample = entry.map_err(ThermoError::from_fault)?;

            if self.filter.is_valid(sample.temperature_c) {
                totals.sum_c += sample.temperature_c;
                totals.count += 1;
                let _ = totals.ids.push(sample.id);
                let _ = totals.temps.push((sample.id, sample.temperature_c));
            }

            // Every sample's resolution is checked, valid reading or not
            if self.resolution.sync(&mut self.bus, &sample)? {
                self.hooks.on_resolution_change();
            }
        }

        Ok(totals)
    }

    /// Commit a completed scan: average, smooth, record, notify.
    fn finish_scan(&mut self, totals: ScanTotals) -> Outcome {
        let count = totals.count;
        let (raw, outcome) = if count > 0 {
            (totals.sum_c / count as f32, Ok(()))
        } else {
            (self.filter.min_sentinel_c(), Err(ThermoError::NoDevice))
        };

        self.last = CycleResult {
            raw_average_c: raw,
            count,
            ids: totals.ids,
            outcome,
        };
        for (id, temp) in totals.temps {
            let _ = self.temps.insert(id, temp);
        }

        if outcome.is_ok() {
            let smoothed = self.smoother.smooth(raw);
            let now = self.clock.now();
            self.stats.record(smoothed, now);
        }

        // Count changes are judged between completed scans only; an aborted
        // scan never learns its count.
        let count_changed = count != self.last_scan_count;
        self.last_scan_count = count;
        if count_changed {
            self.hooks.on_sensor_count_change();
        }

        outcome
    }

    /// Temporally smoothed temperature; `None` before the first success
    pub fn smoothed_temperature(&self) -> Option<f32> {
        self.smoother.value()
    }

    /// Raw average of the most recent cycle (range minimum when nothing
    /// contributed)
    pub fn raw_temperature(&self) -> f32 {
        self.last.raw_average_c
    }

    /// Identifiers that contributed to the most recent cycle
    pub fn contributing_ids(&self) -> &[SensorId] {
        &self.last.ids
    }

    /// Number of sensors that contributed to the most recent cycle
    pub fn contributing_count(&self) -> usize {
        self.last.count
    }

    /// Full result of the most recent cycle
    pub fn last_cycle(&self) -> &CycleResult {
        &self.last
    }

    /// Translated outcome of the most recent cycle attempt
    pub fn last_outcome(&self) -> Outcome {
        self.last_outcome
    }

    /// Did the most recent cycle succeed?
    pub fn is_measured(&self) -> bool {
        self.last_outcome.is_ok()
    }

    /// Last-seen temperature per contributing sensor
    pub fn temperatures(&self) -> impl Iterator<Item = (SensorId, f32)> + '_ {
        self.temps.iter().map(|(id, temp)| (*id, *temp))
    }

    /// Statistics for the current observation period
    pub fn statistics(&self) -> &StatisticsTracker {
        &self.stats
    }

    /// Start a new observation period
    pub fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    /// Set the measurement period.
    ///
    /// Clamped to the bus's minimum conversion time at the configured
    /// resolution - the hardware floor always wins.
    pub fn set_period_ms(&mut self, period_ms: u32) {
        let floor = self.bus.min_conversion_ms(self.resolution.bits());
        self.gate.set_period_ms(period_ms, floor);
    }

    /// Current measurement period in milliseconds
    pub fn period_ms(&self) -> u32 {
        self.gate.period_ms()
    }

    /// Desired resolution in bits
    pub fn resolution_bits(&self) -> u8 {
        self.resolution.bits()
    }

    /// Current pipeline timestamp in milliseconds
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Mutable access to the clock (tick sources need advancing)
    pub fn clock_mut(&mut self) -> &mut T {
        &mut self.clock
    }

    /// Mutable access to the bus driver, for reconfiguration between cycles
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// The installed notification hooks
    pub fn hooks(&self) -> &H {
        &self.hooks
    }
}

/// Builder for [`ThermoPipeline`]
///
/// Collects the configuration surface - valid range, smoothing factor,
/// desired resolution, period, hooks - and wires the pipeline up against the
/// bus's declared power-up sentinel and conversion-time floor.
pub struct PipelineBuilder<B, T, H = NoHooks> {
    bus: B,
    clock: T,
    hooks: H,
    min_c: f32,
    max_c: f32,
    alpha: f32,
    bits: u8,
    period_ms: u32,
}

impl<B, T, H> PipelineBuilder<B, T, H>
where
    B: TemperatureBus,
    T: TimeSource,
    H: CycleHooks,
{
    /// Valid temperature range `[min_c, max_c]` for the filter
    pub fn range_c(mut self, min_c: f32, max_c: f32) -> Self {
        self.min_c = min_c;
        self.max_c = max_c;
        self
    }

    /// Smoothing factor α ∈ (0, 1]; values outside are clamped
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Desired measurement resolution, clamped to 9-12 bits
    pub fn resolution_bits(mut self, bits: u8) -> Self {
        self.bits = bits;
        self
    }

    /// Measurement period (subject to the conversion-time floor)
    pub fn period_ms(mut self, period_ms: u32) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// Install a notification hook set
    pub fn hooks<H2: CycleHooks>(self, hooks: H2) -> PipelineBuilder<B, T, H2> {
        PipelineBuilder {
            bus: self.bus,
            clock: self.clock,
            hooks,
            min_c: self.min_c,
            max_c: self.max_c,
            alpha: self.alpha,
            bits: self.bits,
            period_ms: self.period_ms,
        }
    }

    /// Assemble the pipeline
    pub fn build(self) -> ThermoPipeline<B, T, H> {
        let resolution = ResolutionConfig::new(self.bits);
        let filter = ReadingFilter::new(self.min_c, self.max_c, self.bus.power_up_sentinel_c());
        let floor = self.bus.min_conversion_ms(resolution.bits());

        ThermoPipeline {
            filter,
            resolution,
            gate: CycleGate::new(self.period_ms.max(floor)),
            smoother: ExponentialSmoother::new(self.alpha),
            stats: StatisticsTracker::new(filter.min_sentinel_c()),
            last: CycleResult::empty(filter.min_sentinel_c(), Err(ThermoError::NoDevice)),
            temps: FnvIndexMap::new(),
            last_scan_count: 0,
            last_outcome: Err(ThermoError::NoDevice),
            bus: self.bus,
            clock: self.clock,
            hooks: self.hooks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedTime;
    use crate::traits::{BusFault, SensorSample};

    /// Minimal scripted bus for in-module tests; the integration suite has
    /// the full fault-injecting mock.
    struct ScriptedBus {
        samples: std::vec::Vec<Result<SensorSample, BusFault>>,
        cursor: usize,
    }

    impl ScriptedBus {
        fn new(samples: std::vec::Vec<Result<SensorSample, BusFault>>) -> Self {
            Self { samples, cursor: 0 }
        }
    }

    impl TemperatureBus for ScriptedBus {
        fn trigger_conversion(&mut self) -> Result<(), BusFault> {
            Ok(())
        }

        fn start_scan(&mut self) {
            self.cursor = 0;
        }

        fn next_sensor(&mut self) -> Option<Result<SensorSample, BusFault>> {
            let entry = self.samples.get(self.cursor).cloned();
            self.cursor += 1;
            entry
        }

        fn cache_resolution_bits(&mut self, _id: SensorId, _bits: u8) {}

        fn persist_cache(&mut self, _id: SensorId) -> Result<(), BusFault> {
            Ok(())
        }

        fn power_up_sentinel_c(&self) -> f32 {
            -0.05
        }

        fn min_conversion_ms(&self, _bits: u8) -> u32 {
            750
        }
    }

    fn sample(id: SensorId, temperature_c: f32) -> Result<SensorSample, BusFault> {
        Ok(SensorSample {
            id,
            temperature_c,
            resolution_bits: 12,
        })
    }

    #[test]
    fn average_of_valid_readings() {
        let bus = ScriptedBus::new(vec![sample(1, 21.5), sample(2, 21.7)]);
        let mut pipeline = ThermoPipeline::builder(bus, FixedTime::new(1000))
            .range_c(-20.0, 60.0)
            .build();

        assert!(pipeline.run_cycle().is_ok());
        assert!((pipeline.raw_temperature() - 21.6).abs() < 1e-5);
        assert_eq!(pipeline.contributing_count(), 2);
        assert_eq!(pipeline.contributing_ids(), &[1, 2]);
    }

    #[test]
    fn empty_bus_reports_no_device() {
        let bus = ScriptedBus::new(vec![]);
        let mut pipeline = ThermoPipeline::builder(bus, FixedTime::new(1000))
            .range_c(-20.0, 60.0)
            .build();

        assert_eq!(pipeline.run_cycle(), Err(ThermoError::NoDevice));
        // Raw value is the defined minimum sentinel, never uninitialized
        assert_eq!(pipeline.raw_temperature(), -20.0);
        assert_eq!(pipeline.contributing_count(), 0);
        assert!(pipeline.smoothed_temperature().is_none());
    }

    #[test]
    fn sentinel_and_out_of_range_are_excluded() {
        // Mixed bus: two real readings, one power-up placeholder, one outlier
        let bus = ScriptedBus::new(vec![
            sample(1, 21.5),
            sample(2, 21.7),
            sample(3, -0.05),
            sample(4, 85.0),
        ]);
        let mut pipeline = ThermoPipeline::builder(bus, FixedTime::new(1000))
            .range_c(-20.0, 60.0)
            .build();

        assert!(pipeline.run_cycle().is_ok());
        assert_eq!(pipeline.contributing_count(), 2);
        assert_eq!(pipeline.contributing_ids(), &[1, 2]);
        assert!((pipeline.raw_temperature() - 21.6).abs() < 1e-5);
    }

    #[test]
    fn period_setter_respects_conversion_floor() {
        let bus = ScriptedBus::new(vec![]);
        let mut pipeline = ThermoPipeline::builder(bus, FixedTime::new(0)).build();

        pipeline.set_period_ms(10);
        assert_eq!(pipeline.period_ms(), 750);

        pipeline.set_period_ms(5000);
        assert_eq!(pipeline.period_ms(), 5000);
    }

    #[test]
    fn poll_gates_on_the_period() {
        let bus = ScriptedBus::new(vec![sample(1, 20.0)]);
        let mut pipeline = ThermoPipeline::builder(bus, FixedTime::new(0))
            .period_ms(1000)
            .build();

        // First poll is due immediately
        assert!(pipeline.poll().is_ok());

        // Not due again until a full period elapsed
        assert!(matches!(pipeline.poll(), Err(nb::Error::WouldBlock)));
        pipeline.clock_mut().advance(999);
        assert!(matches!(pipeline.poll(), Err(nb::Error::WouldBlock)));
        pipeline.clock_mut().advance(1);
        assert!(pipeline.poll().is_ok());
    }

    #[test]
    fn temperatures_map_tracks_last_seen() {
        let bus = ScriptedBus::new(vec![sample(7, 19.0), sample(9, 23.0)]);
        let mut pipeline = ThermoPipeline::builder(bus, FixedTime::new(0)).build();
        pipeline.run_cycle().unwrap();

        let mut temps: std::vec::Vec<_> = pipeline.temperatures().collect();
        temps.sort_by_key(|(id, _)| *id);
        assert_eq!(temps, vec![(7, 19.0), (9, 23.0)]);

        // A sensor that warms up overwrites its entry next cycle
        pipeline.bus_mut().samples[1] = sample(9, 24.0);
        pipeline.run_cycle().unwrap();
        let mut temps: std::vec::Vec<_> = pipeline.temperatures().collect();
        temps.sort_by_key(|(id, _)| *id);
        assert_eq!(temps, vec![(7, 19.0), (9, 24.0)]);
    }
}
