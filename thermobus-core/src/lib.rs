//! Acquisition and aggregation core for multi-sensor temperature buses
//!
//! Periodically scans every sensor sharing one bus, filters out implausible
//! readings, averages the rest into a single representative value, smooths it
//! over time, and tracks max/min/average statistics for the current
//! observation period.
//!
//! Key constraints:
//! - No heap allocation in the measurement path
//! - Single-threaded, cooperative; `run_cycle()` blocks for the scan
//! - All failure is reported through a small closed outcome set
//!
//! ```no_run
//! use thermobus_core::{ThermoPipeline, TemperatureBus};
//! use thermobus_core::time::SystemTime;
//! # fn demo<B: TemperatureBus>(bus: B) {
//! let mut pipeline = ThermoPipeline::builder(bus, SystemTime)
//!     .range_c(-20.0, 60.0)
//!     .alpha(0.2)
//!     .resolution_bits(12)
//!     .build();
//!
//! match pipeline.run_cycle() {
//!     Ok(()) => { let _t = pipeline.smoothed_temperature(); }
//!     Err(e) => { /* handle translated bus fault */ let _ = e; }
//! }
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod filter;
pub mod pipeline;
pub mod resolution;
pub mod smoothing;
pub mod stats;
pub mod time;
pub mod traits;

// Public API
pub use errors::{Outcome, ThermoError};
pub use filter::ReadingFilter;
pub use pipeline::{CycleResult, PipelineBuilder, ThermoPipeline, MAX_SENSORS};
pub use resolution::ResolutionConfig;
pub use smoothing::ExponentialSmoother;
pub use stats::{StatisticsSnapshot, StatisticsTracker};
pub use traits::{BusFault, CycleHooks, NoHooks, SensorId, SensorSample, TemperatureBus};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
