//! Collaborator Traits at the Hardware Seam
//!
//! ## Overview
//!
//! The pipeline never talks to one-wire electronics directly. Everything it
//! needs from the driver is expressed by the [`TemperatureBus`] trait: trigger
//! a conversion, walk the (lazy, finite, restartable) sensor sequence, and
//! manage per-sensor resolution. Notification points are expressed by
//! [`CycleHooks`].
//!
//! Keep these traits simple - embedded drivers don't need complex
//! abstractions, and the pipeline is single-threaded by contract.
//!
//! ## Scan Model
//!
//! One cycle performs one pass over the bus:
//!
//! ```text
//! trigger_conversion() → start_scan() → next_sensor() … until None
//! ```
//!
//! The order sensors are yielded in is whatever the driver produces and is
//! not guaranteed stable across cycles. A `Some(Err(_))` entry is a bus-level
//! fault (CRC failure, conversion failure) and aborts the whole cycle;
//! `None` simply ends the pass.

/// Sensor identity on the bus (e.g. a 64-bit ROM code)
pub type SensorId = u64;

/// One sensor's contribution to a scan pass
///
/// Transient - produced and consumed within one scan iteration, never
/// retained by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// Bus-unique sensor identifier
    pub id: SensorId,
    /// Raw converted temperature in degrees Celsius
    pub temperature_c: f32,
    /// Measurement resolution the sensor is currently configured for (9-12)
    pub resolution_bits: u8,
}

/// Low-level driver fault codes
///
/// This is the raw vocabulary the driver speaks. The pipeline translates it
/// into the closed [`ThermoError`](crate::errors::ThermoError) set and never
/// exposes these directly to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BusFault {
    /// No device answered the bus reset
    NoDevice,
    /// A device answered but is not a temperature sensor
    NoSensor,
    /// Temperature conversion did not complete
    Conversion,
    /// CRC failure on the device address (ROM code)
    CrcAddress,
    /// CRC failure on the device scratchpad data
    CrcScratchpad,
    /// Sensor enumeration reached the end of the bus
    EndOfList,
    /// No alarm condition present
    NoAlarm,
    /// Low-temperature alarm raised
    AlarmLow,
    /// High-temperature alarm raised
    AlarmHigh,
}

/// Driver interface for a shared temperature bus
///
/// Implementations own device discovery, addressing, and the electrical
/// protocol; the pipeline only sequences calls. All methods are blocking -
/// conversion timing is hardware-determined.
pub trait TemperatureBus {
    /// Start a temperature conversion on every sensor on the bus.
    ///
    /// Blocks until the conversion window has elapsed. A fault here aborts
    /// the cycle before any sensor is read.
    fn trigger_conversion(&mut self) -> Result<(), BusFault>;

    /// Restart the lazy sensor sequence for a fresh pass.
    fn start_scan(&mut self);

    /// Yield the next sensor on the bus, or `None` when the pass is done.
    ///
    /// `Some(Err(_))` reports a bus-level fault for the sensor being read.
    fn next_sensor(&mut self) -> Option<Result<SensorSample, BusFault>>;

    /// Stage a new resolution setting for one sensor.
    fn cache_resolution_bits(&mut self, id: SensorId, bits: u8);

    /// Write the staged settings to the sensor's non-volatile store.
    fn persist_cache(&mut self, id: SensorId) -> Result<(), BusFault>;

    /// Fixed placeholder a sensor reports before its first real conversion.
    fn power_up_sentinel_c(&self) -> f32;

    /// Minimum conversion time in milliseconds at the given resolution.
    ///
    /// This is the hard floor for the measurement period - polling faster
    /// than the hardware can convert yields garbage readings.
    fn min_conversion_ms(&self, bits: u8) -> u32;
}

/// Synchronous notification hooks fired by the pipeline
///
/// All methods default to no-ops; implement only the ones you care about.
/// Hooks run on the calling thread, inside `run_cycle()` - keep them short.
pub trait CycleHooks {
    /// One successful cycle completed (fires after the statistics update).
    fn on_success(&mut self) {}

    /// One cycle failed (fires in place of `on_success`).
    fn on_failure(&mut self) {}

    /// A sensor's resolution was corrected (fires during the scan, once per
    /// affected sensor, before the cycle's overall outcome is known).
    fn on_resolution_change(&mut self) {}

    /// The number of contributing sensors differs from the previous
    /// completed cycle (fires before `on_success`/`on_failure`).
    fn on_sensor_count_change(&mut self) {}
}

/// Zero-sized hook set that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl CycleHooks for NoHooks {}
