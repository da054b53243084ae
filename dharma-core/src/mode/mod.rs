//! Mode engine
//!
//! The central state machine: selects the active counter mode, routes
//! semantic events to the counting policy of that mode, and reports the
//! side effects (sounds, redraws, faults) for collaborators to perform.

pub mod engine;
pub mod events;

pub use engine::{ModeEngine, Outcome, RunState, View};
pub use events::{ConfigCommand, Event, Notification, SlotCommand, SoundId};

/// How a mode counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModePolicy {
    /// Counted by button presses only
    Manual,
    /// Counted by the prostration detector while started
    SensorDriven,
}
