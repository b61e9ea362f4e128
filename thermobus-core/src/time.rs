//! Time sources and the measurement-period gate
//!
//! Provides a clock abstraction so the pipeline works the same whether time
//! comes from a hardware tick counter, the OS clock, or a test fixture, plus
//! the elapsed-time gate that paces measurement cycles.

/// Timestamp in milliseconds since epoch (or device boot for monotonic)
pub type Timestamp = u64;

/// Source of time for the pipeline
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time (vs monotonic)
    fn is_wall_clock(&self) -> bool;
}

/// Tick-counter time source, advanced by the application
///
/// Starts at 0 on boot, always increases. Feed it from a SysTick or RTOS
/// tick handler via [`TickTime::advance`].
#[derive(Debug, Clone)]
pub struct TickTime {
    elapsed_ms: Timestamp,
}

impl TickTime {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self { elapsed_ms: 0 }
    }

    /// Advance the counter by `ms` milliseconds
    pub fn advance(&mut self, ms: u64) {
        self.elapsed_ms += ms;
    }
}

impl Default for TickTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for TickTime {
    fn now(&self) -> Timestamp {
        self.elapsed_ms
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    /// Create a source pinned at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Pin the source at a new timestamp
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Advance the pinned timestamp by `ms`
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Elapsed-time gate pacing measurement cycles
///
/// A cycle is due when at least one period has elapsed since the gate was
/// last armed. A freshly created gate is immediately due, so the first cycle
/// runs without waiting out a full period.
///
/// The period floor is enforced where the gate is configured (see
/// [`ThermoPipeline::set_period_ms`](crate::pipeline::ThermoPipeline::set_period_ms)):
/// it can never drop below the bus's minimum conversion time.
#[derive(Debug, Clone)]
pub struct CycleGate {
    period_ms: u32,
    last_run: Option<Timestamp>,
}

impl CycleGate {
    /// Create a gate with the given period
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_run: None,
        }
    }

    /// Current period in milliseconds
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Set the period, clamped to `floor_ms`.
    ///
    /// The floor is a hard limit, not a suggestion - see
    /// [`TemperatureBus::min_conversion_ms`](crate::traits::TemperatureBus::min_conversion_ms).
    pub fn set_period_ms(&mut self, period_ms: u32, floor_ms: u32) {
        self.period_ms = period_ms.max(floor_ms);
    }

    /// Is a new cycle due at `now`?
    pub fn is_due(&self, now: Timestamp) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_sub(last) >= u64::from(self.period_ms),
        }
    }

    /// Mark a cycle as started at `now`
    pub fn arm(&mut self, now: Timestamp) {
        self.last_run = Some(now);
    }
}
