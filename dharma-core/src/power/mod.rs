//! Power management
//!
//! Dims the backlight after a period without activity and finally puts
//! the device into deep sleep. A single activity timestamp drives both
//! timeouts.

pub mod manager;

pub use manager::{PowerManager, PowerState, PowerTransition};

/// Why the device started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeCause {
    /// Cold boot or reset
    PowerOn,
    /// Woken from deep sleep by the wake button
    WakeButton,
}
