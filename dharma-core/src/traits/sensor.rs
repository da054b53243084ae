//! Distance sensor trait

/// Errors that can occur with distance sensing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Sensor did not acknowledge on the bus
    NotResponding,
    /// Bus transfer failed mid-transaction
    Bus,
    /// Measurement completed but was flagged invalid by the sensor
    InvalidMeasurement,
}

/// Trait for time-of-flight distance sensors
///
/// The sensor runs in continuous mode; the control loop polls it once per
/// tick and takes whatever measurement is ready.
pub trait DistanceSensor {
    /// Poll for a completed measurement in millimeters
    ///
    /// Returns `Ok(None)` when no new measurement is ready yet. Must not
    /// block waiting for the sensor.
    fn poll_mm(&mut self) -> Result<Option<u16>, SensorError>;
}
