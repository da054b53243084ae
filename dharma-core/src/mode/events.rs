//! Events into and notifications out of the mode engine

use crate::config::{ApCredentials, Title};
use crate::error::Fault;

/// Semantic events the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Count one up
    Increment,
    /// Count one down
    Decrement,
    /// Set the active counter to zero (long press on decrement)
    Reset,
    /// Select the next visible mode
    NextMode,
    /// Select the previous visible mode
    PreviousMode,
    /// Toggle prostration counting between started and paused
    StartPause,
    /// Toggle audio feedback
    ToggleSound,
    /// The prostration detector saw one full repetition
    RepetitionCompleted,
}

impl Event {
    /// Check if this event changes the active mode
    pub fn is_navigation(&self) -> bool {
        matches!(self, Event::NextMode | Event::PreviousMode)
    }
}

/// Sound cues for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoundId {
    Increment,
    Decrement,
    Next,
    Previous,
    /// Counter reset to zero
    Zero,
    /// Goal value reached
    Goal,
    /// Sound was switched back on
    SoundOn,
}

/// Side effects requested from collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    /// Play a sound cue
    Sound(SoundId),
    /// Displayed state changed
    Refresh,
    /// A different mode is now active
    ModeChanged(u8),
    /// Degraded operation
    Fault(Fault),
}

/// Slot edits from the configuration server
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotCommand {
    /// Rename a slot
    SetTitle { slot: u8, title: Title },
    /// Change a slot's goal value
    SetMaxValue { slot: u8, max_value: u32 },
    /// Show or hide a slot in navigation
    SetVisible { slot: u8, visible: bool },
    /// Zero a slot's counter
    ResetValue { slot: u8 },
    /// Open an edit session on a slot
    BeginEdit { slot: u8 },
    /// Close the edit session and flush
    EndEdit,
}

/// Commands from the configuration server
///
/// Applied by the control loop between ticks, so the counters keep a
/// single writer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigCommand {
    /// Edit a counter slot
    Slot(SlotCommand),
    /// Replace the access point credentials
    SetCredentials(ApCredentials),
    /// Configuration server started or stopped (holds off power saving)
    SetServerActive(bool),
}
