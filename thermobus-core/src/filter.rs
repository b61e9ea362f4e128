//! Validity filter for raw sensor readings
//!
//! A reading survives the filter only if it is a finite number, lies inside
//! the closed configured range, and is not the sensor's power-up placeholder.
//!
//! The placeholder check exists because a freshly joined sensor reports a
//! fixed "just powered on, never converted" value instead of a real reading.
//! Such a value can sit comfortably inside the valid range, and averaging it
//! in would corrupt the cycle. Both checks are independent - either one
//! excludes the reading.

/// How close a reading must be to the power-up placeholder to count as one.
///
/// Real conversions are quantized to at worst 0.5°C steps (9-bit), so a
/// tolerance far below that granularity cannot swallow genuine readings.
const SENTINEL_TOLERANCE_C: f32 = 1e-3;

/// Range-and-sentinel filter, immutable after construction
#[derive(Debug, Clone, Copy)]
pub struct ReadingFilter {
    /// Lower bound of the valid range in Celsius (inclusive)
    min_c: f32,

    /// Upper bound of the valid range in Celsius (inclusive)
    max_c: f32,

    /// The sensor family's power-up placeholder reading
    sentinel_c: f32,
}

impl ReadingFilter {
    /// Create a filter for the closed range `[min_c, max_c]`.
    ///
    /// A reversed range is swapped rather than rejected - there is no
    /// meaningful recovery at this layer.
    pub fn new(min_c: f32, max_c: f32, sentinel_c: f32) -> Self {
        let (min_c, max_c) = if min_c > max_c { (max_c, min_c) } else { (min_c, max_c) };

        Self {
            min_c,
            max_c,
            sentinel_c,
        }
    }

    /// Classify one raw reading.
    ///
    /// Returns `true` when the reading may contribute to the cycle average.
    pub fn is_valid(&self, value_c: f32) -> bool {
        if !value_c.is_finite() {
            return false;
        }
        if value_c < self.min_c || value_c > self.max_c {
            return false;
        }
        if libm::fabsf(value_c - self.sentinel_c) < SENTINEL_TOLERANCE_C {
            return false;
        }
        true
    }

    /// The configured range minimum.
    ///
    /// Doubles as the defined raw value reported for cycles where no sensor
    /// contributed, so downstream consumers never see an uninitialized
    /// temperature.
    pub fn min_sentinel_c(&self) -> f32 {
        self.min_c
    }

    /// The configured range maximum
    pub fn max_c(&self) -> f32 {
        self.max_c
    }
}
