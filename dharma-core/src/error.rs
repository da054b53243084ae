//! Runtime fault taxonomy
//!
//! Faults never halt the device. Hardware faults silence the affected
//! input, overflow clamps the counter, persistence faults only affect
//! durability and are retried at the next flush opportunity.

use crate::config::RecordError;
use crate::input::ButtonId;
use crate::traits::StorageError;

/// Input hardware that can report a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareSource {
    /// A button pin could not be read
    Button(ButtonId),
    /// The distance sensor returned an error
    DistanceSensor,
}

/// Failure while writing records to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// The storage backend rejected the write
    Storage(StorageError),
    /// The record could not be encoded
    Record(RecordError),
}

impl From<StorageError> for PersistError {
    fn from(e: StorageError) -> Self {
        PersistError::Storage(e)
    }
}

impl From<RecordError> for PersistError {
    fn from(e: RecordError) -> Self {
        PersistError::Record(e)
    }
}

/// A degraded-operation condition reported to collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Sensor or pin unreadable; the source emits no events until it recovers
    Hardware(HardwareSource),
    /// Counter reached the largest representable value and was clamped
    Overflow {
        /// Slot that saturated
        slot: u8,
    },
    /// Storage read or write failed; counting continues in memory
    Persistence(PersistError),
}

impl Fault {
    /// Check if this fault only affects durability
    pub fn is_persistence(&self) -> bool {
        matches!(self, Fault::Persistence(_))
    }
}
