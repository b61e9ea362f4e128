//! Resolution synchronizer
//!
//! Every scanned sensor reports the resolution it is currently configured
//! for. When that differs from the desired setting, the synchronizer stages
//! the correction on the driver and persists it, so the *next* conversion
//! runs at the right precision.
//!
//! A failed persist aborts the whole cycle rather than being skipped: an
//! inconsistent device state must not silently propagate into later
//! averages.

use crate::{
    errors::ThermoError,
    traits::{SensorSample, TemperatureBus},
};

/// Lowest supported measurement resolution
pub const RESOLUTION_MIN_BITS: u8 = 9;

/// Highest supported measurement resolution
pub const RESOLUTION_MAX_BITS: u8 = 12;

// Optional logging, same shape as the driver-facing diagnostics elsewhere
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Desired measurement resolution, immutable after construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionConfig {
    bits: u8,
}

impl ResolutionConfig {
    /// Create a config clamped to the supported 9-12 bit window
    pub fn new(bits: u8) -> Self {
        Self {
            bits: bits.clamp(RESOLUTION_MIN_BITS, RESOLUTION_MAX_BITS),
        }
    }

    /// Desired resolution in bits
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Compare one sensor's reported resolution against the desired setting
    /// and correct it on mismatch.
    ///
    /// Returns `Ok(true)` when a correction was applied (the caller fires the
    /// resolution-change notification exactly once per affected sensor),
    /// `Ok(false)` when the sensor already matches. A persist failure is
    /// fatal to the cycle and comes back translated.
    pub fn sync<B: TemperatureBus>(
        &self,
        bus: &mut B,
        sample: &SensorSample,
    ) -> Result<bool, ThermoError> {
        if sample.resolution_bits == self.bits {
            return Ok(false);
        }

        log_debug!(
            "sensor {:#x} resolution: {} -> {} bits",
            sample.id,
            sample.resolution_bits,
            self.bits
        );

        bus.cache_resolution_bits(sample.id, self.bits);
        bus.persist_cache(sample.id)
            .map_err(ThermoError::from_fault)?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_clamped_to_supported_window() {
        assert_eq!(ResolutionConfig::new(7).bits(), 9);
        assert_eq!(ResolutionConfig::new(9).bits(), 9);
        assert_eq!(ResolutionConfig::new(11).bits(), 11);
        assert_eq!(ResolutionConfig::new(12).bits(), 12);
        assert_eq!(ResolutionConfig::new(14).bits(), 12);
    }
}
