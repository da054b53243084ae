//! Hardware abstraction traits
//!
//! These traits define the interface between the counting logic and
//! board-specific implementations.

pub mod button;
pub mod power;
pub mod sensor;
pub mod storage;

pub use button::{ButtonPin, PinError};
pub use power::PowerControl;
pub use sensor::{DistanceSensor, SensorError};
pub use storage::{SettingsStorage, StorageError, StorageKey};
