//! Windowed statistics over the smoothed temperature
//!
//! ## Overview
//!
//! Three independent running reducers cover one observation period:
//!
//! - **max**: greatest value seen, plus the timestamp of the call that first
//!   achieved it (ties do not move the timestamp)
//! - **min**: symmetric to max
//! - **average**: arithmetic mean of every recorded value, computed
//!   incrementally - no unbounded history
//!
//! The caller starts a new observation period with [`StatisticsTracker::reset`].
//! Querying an empty tracker is a defined no-op: the extremes report the
//! configured sentinel, the mean reports zero, timestamps report zero.

use crate::time::Timestamp;

/// Running extreme with the timestamp of its first occurrence
#[derive(Debug, Clone, Copy)]
struct Extreme {
    value: f32,
    at: Timestamp,
}

/// Max/min/average reducers for the current observation period
#[derive(Debug, Clone)]
pub struct StatisticsTracker {
    /// Value reported by empty extreme queries
    empty_value: f32,

    max: Option<Extreme>,
    min: Option<Extreme>,

    /// Incremental mean state
    mean: f32,
    count: u32,
}

/// Point-in-time copy of the tracker's reducers
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatisticsSnapshot {
    /// Greatest value recorded this period
    pub max_c: f32,
    /// When the maximum was first achieved
    pub max_at: Timestamp,
    /// Smallest value recorded this period
    pub min_c: f32,
    /// When the minimum was first achieved
    pub min_at: Timestamp,
    /// Arithmetic mean of all recorded values this period
    pub mean_c: f32,
    /// Number of recorded values this period
    pub samples: u32,
}

impl StatisticsTracker {
    /// Create an empty tracker.
    ///
    /// `empty_value` is what the extreme getters report before the first
    /// `record` call (typically the pipeline's configured range minimum).
    pub fn new(empty_value: f32) -> Self {
        Self {
            empty_value,
            max: None,
            min: None,
            mean: 0.0,
            count: 0,
        }
    }

    /// Fold one value into all three reducers.
    pub fn record(&mut self, value: f32, now: Timestamp) {
        match &mut self.max {
            Some(max) if value > max.value => *max = Extreme { value, at: now },
            Some(_) => {}
            None => self.max = Some(Extreme { value, at: now }),
        }

        match &mut self.min {
            Some(min) if value < min.value => *min = Extreme { value, at: now },
            Some(_) => {}
            None => self.min = Some(Extreme { value, at: now }),
        }

        self.count += 1;
        self.mean += (value - self.mean) / self.count as f32;
    }

    /// Clear all three reducers, starting a new observation period.
    pub fn reset(&mut self) {
        self.max = None;
        self.min = None;
        self.mean = 0.0;
        self.count = 0;
    }

    /// Greatest recorded value, or the empty sentinel
    pub fn max_c(&self) -> f32 {
        self.max.map_or(self.empty_value, |e| e.value)
    }

    /// Timestamp at which the current maximum was first achieved, or 0
    pub fn max_at(&self) -> Timestamp {
        self.max.map_or(0, |e| e.at)
    }

    /// Smallest recorded value, or the empty sentinel
    pub fn min_c(&self) -> f32 {
        self.min.map_or(self.empty_value, |e| e.value)
    }

    /// Timestamp at which the current minimum was first achieved, or 0
    pub fn min_at(&self) -> Timestamp {
        self.min.map_or(0, |e| e.at)
    }

    /// Mean of all recorded values, or 0.0 when empty
    pub fn mean_c(&self) -> f32 {
        self.mean
    }

    /// Number of values recorded since the last reset
    pub fn samples(&self) -> u32 {
        self.count
    }

    /// Copy out the current reducer state
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            max_c: self.max_c(),
            max_at: self.max_at(),
            min_c: self.min_c(),
            min_at: self.min_at(),
            mean_c: self.mean_c(),
            samples: self.count,
        }
    }
}
