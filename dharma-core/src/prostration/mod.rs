//! Prostration detection
//!
//! A time-of-flight sensor faces the practitioner. Going down brings the
//! body close to the sensor, standing up moves it away again; one full
//! down-then-up cycle is one repetition.

pub mod detector;

pub use detector::{DetectorEvent, Position, ProstrationDetector, ProstrationState};

use crate::time::Instant;

/// One distance measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceSample {
    /// Measured distance
    pub millimeters: u16,
    /// When the measurement was taken
    pub timestamp: Instant,
    /// False if the sensor reported an error for this measurement
    pub valid: bool,
}

impl DistanceSample {
    /// A good measurement
    pub const fn valid(millimeters: u16, timestamp: Instant) -> Self {
        Self {
            millimeters,
            timestamp,
            valid: true,
        }
    }

    /// A failed measurement
    pub const fn invalid(timestamp: Instant) -> Self {
        Self {
            millimeters: 0,
            timestamp,
            valid: false,
        }
    }
}
