//! Error Taxonomy for Cycle Outcomes
//!
//! ## Design Philosophy
//!
//! The pipeline translates the driver's many low-level fault codes into a
//! small closed set that control loops can actually act on:
//!
//! 1. **Small Size**: Errors are plain unit variants, `Copy`, and cheap to
//!    store in the per-cycle outcome slot.
//!
//! 2. **No Heap Allocation**: No `String` payloads - all messages are static.
//!
//! 3. **Closed Set**: Every driver fault maps onto exactly one variant, with
//!    `Unknown` as the defensive default for anything unrecognized. The
//!    mapping lives here so revisions of the driver cannot silently change
//!    which faults mean what.
//!
//! ## Error Categories
//!
//! - `NoDevice`: nothing contributed - no sensors responded, or every reading
//!   was filtered out as invalid or power-up placeholder
//! - `Address`: device addressing/identity check failed on the bus
//! - `Data`: a sensor's reading failed its integrity check
//! - `Unknown`: unrecognized driver fault
//!
//! Per-sensor invalidity is *not* an error: a filtered-out reading merely
//! excludes that sensor from the average. The cycle as a whole only fails
//! when zero sensors contribute.

use thiserror_no_std::Error;

use crate::traits::BusFault;

/// Outcome of one measurement cycle
pub type Outcome = Result<(), ThermoError>;

/// Cycle errors - the closed taxonomy visible to callers
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermoError {
    /// No sensor contributed a valid reading this cycle
    #[error("no sensor contributed a valid reading")]
    NoDevice,

    /// Device addressing or identity check failed
    #[error("device address check failed")]
    Address,

    /// Data integrity check on a sensor reading failed
    #[error("sensor data integrity check failed")]
    Data,

    /// Unrecognized driver fault - defensive default
    #[error("unrecognized bus fault")]
    Unknown,
}

impl ThermoError {
    /// Translate a low-level driver fault into the closed taxonomy.
    ///
    /// The mapping is canonical and intentionally coalesces the driver's
    /// "nothing there" family (`EndOfList`, `NoDevice`, `NoSensor`,
    /// `Conversion`) into a single [`ThermoError::NoDevice`]. Alarm codes
    /// carry no meaning for aggregation and fall through to `Unknown`.
    pub fn from_fault(fault: BusFault) -> Self {
        match fault {
            BusFault::EndOfList
            | BusFault::NoDevice
            | BusFault::NoSensor
            | BusFault::Conversion => Self::NoDevice,
            BusFault::CrcAddress => Self::Address,
            BusFault::CrcScratchpad => Self::Data,
            _ => Self::Unknown,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ThermoError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NoDevice => defmt::write!(fmt, "no contributing sensor"),
            Self::Address => defmt::write!(fmt, "address check failed"),
            Self::Data => defmt::write!(fmt, "data check failed"),
            Self::Unknown => defmt::write!(fmt, "unknown bus fault"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_translation_is_canonical() {
        assert_eq!(ThermoError::from_fault(BusFault::EndOfList), ThermoError::NoDevice);
        assert_eq!(ThermoError::from_fault(BusFault::NoDevice), ThermoError::NoDevice);
        assert_eq!(ThermoError::from_fault(BusFault::NoSensor), ThermoError::NoDevice);
        assert_eq!(ThermoError::from_fault(BusFault::Conversion), ThermoError::NoDevice);
        assert_eq!(ThermoError::from_fault(BusFault::CrcAddress), ThermoError::Address);
        assert_eq!(ThermoError::from_fault(BusFault::CrcScratchpad), ThermoError::Data);
    }

    #[test]
    fn alarm_faults_are_unknown() {
        assert_eq!(ThermoError::from_fault(BusFault::NoAlarm), ThermoError::Unknown);
        assert_eq!(ThermoError::from_fault(BusFault::AlarmLow), ThermoError::Unknown);
        assert_eq!(ThermoError::from_fault(BusFault::AlarmHigh), ThermoError::Unknown);
    }
}
