//! Mode engine state machine
//!
//! State is `active mode × {Viewing, Editing}` plus the prostration run
//! state and the sound flag. Events with no valid transition in the
//! current state are dropped without error; button mashing never does
//! more than produce no-ops.

use heapless::Vec;

use super::events::{Event, Notification, SlotCommand, SoundId};
use super::ModePolicy;
use crate::config::MODES;
use crate::counter::{CounterError, CounterStore, Decrement, Increment};
use crate::error::Fault;
use crate::input::{ButtonId, PressEvent, PressKind};

/// Maximum notifications produced by one event
pub const MAX_NOTIFICATIONS: usize = 4;

/// Whether a slot is being edited from the configuration server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum View {
    /// Normal counting display
    Viewing,
    /// Edit session open on a slot
    Editing(u8),
}

/// Prostration counting run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// Detector repetitions are ignored
    Paused,
    /// Detector repetitions are counted
    Started,
}

/// Effects of one event or command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Notifications for collaborators, in order
    pub notifications: Vec<Notification, MAX_NOTIFICATIONS>,
    /// Dirty slots should be flushed now
    pub flush: bool,
    /// Device settings (active mode, sound flag) changed
    pub settings_changed: bool,
}

impl Outcome {
    fn push(&mut self, notification: Notification) {
        // Capacity covers the longest sequence any transition emits
        let _ = self.notifications.push(notification);
    }

    /// Check if the event changed anything
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty() && !self.flush && !self.settings_changed
    }
}

/// The mode engine
///
/// Owns the counter store; it is the only writer of counter state.
#[derive(Debug, Clone)]
pub struct ModeEngine {
    store: CounterStore,
    active: usize,
    view: View,
    run: RunState,
    sound_on: bool,
}

impl ModeEngine {
    /// Create an engine viewing `active`
    ///
    /// An active index that is out of range or hidden falls back to the
    /// first visible slot.
    pub fn new(store: CounterStore, active: usize, sound_on: bool) -> Self {
        let active = if store.is_selectable(active) {
            active
        } else {
            store.first_visible()
        };
        Self {
            store,
            active,
            view: View::Viewing,
            run: RunState::Paused,
            sound_on,
        }
    }

    /// Active slot index
    pub fn active(&self) -> usize {
        self.active
    }

    /// Counting policy of the active slot
    pub fn policy(&self) -> ModePolicy {
        self.store.slots()[self.active].kind.policy()
    }

    /// Current view
    pub fn view(&self) -> View {
        self.view
    }

    /// Prostration run state
    pub fn run_state(&self) -> RunState {
        self.run
    }

    /// Check if the detector should be counting
    pub fn is_counting(&self) -> bool {
        self.policy() == ModePolicy::SensorDriven && self.run == RunState::Started
    }

    /// Audio feedback enabled
    pub fn sound_on(&self) -> bool {
        self.sound_on
    }

    /// Counter slots
    pub fn store(&self) -> &CounterStore {
        &self.store
    }

    /// Counter slots, for flushing
    pub fn store_mut(&mut self) -> &mut CounterStore {
        &mut self.store
    }

    /// Long-press threshold for the active mode
    pub fn long_press_ms(&self, base_ms: u16) -> u16 {
        let factor = self.store.slots()[self.active].kind.long_press_factor();
        base_ms.saturating_mul(factor)
    }

    /// Translate a debounced button event into an engine event
    ///
    /// `Press` edges carry no action of their own.
    pub fn map_press(&self, press: PressEvent) -> Option<Event> {
        match (press.source, press.kind) {
            (ButtonId::Increment, PressKind::Release) => Some(Event::Increment),
            (ButtonId::Decrement, PressKind::Release) => Some(Event::Decrement),
            (ButtonId::Decrement, PressKind::LongPress) => Some(Event::Reset),
            (ButtonId::Prostration, PressKind::Release) => match self.policy() {
                ModePolicy::SensorDriven => Some(Event::StartPause),
                ModePolicy::Manual => Some(Event::ToggleSound),
            },
            (ButtonId::Prostration, PressKind::LongPress) => Some(Event::ToggleSound),
            (ButtonId::Next, PressKind::Release) => Some(Event::NextMode),
            (ButtonId::Previous, PressKind::Release) => Some(Event::PreviousMode),
            _ => None,
        }
    }

    /// Apply one event
    pub fn apply_event(&mut self, event: Event) -> Outcome {
        let mut out = Outcome::default();
        match event {
            Event::NextMode => self.navigate(true, &mut out),
            Event::PreviousMode => self.navigate(false, &mut out),
            Event::ToggleSound => {
                self.sound_on = !self.sound_on;
                out.settings_changed = true;
                if self.sound_on {
                    out.push(Notification::Sound(SoundId::SoundOn));
                }
                out.push(Notification::Refresh);
            }
            _ => match self.policy() {
                ModePolicy::Manual => self.apply_manual(event, &mut out),
                ModePolicy::SensorDriven => self.apply_sensor_driven(event, &mut out),
            },
        }
        out
    }

    fn apply_manual(&mut self, event: Event, out: &mut Outcome) {
        match event {
            Event::Increment => self.count_up(out),
            Event::Decrement => self.count_down(out),
            Event::Reset => self.reset_active(out),
            // No sensor and no run state in manual modes
            _ => {}
        }
    }

    fn apply_sensor_driven(&mut self, event: Event, out: &mut Outcome) {
        match event {
            Event::RepetitionCompleted if self.run == RunState::Started => self.count_up(out),
            // Buttons still correct the count by hand
            Event::Increment => self.count_up(out),
            Event::Decrement => self.count_down(out),
            Event::Reset => self.reset_active(out),
            Event::StartPause => {
                self.run = match self.run {
                    RunState::Paused => RunState::Started,
                    RunState::Started => RunState::Paused,
                };
                out.push(Notification::Refresh);
            }
            _ => {}
        }
    }

    fn count_up(&mut self, out: &mut Outcome) {
        let Ok(result) = self.store.increment(self.active) else {
            return;
        };
        match result {
            Increment::Counted => self.sound(SoundId::Increment, out),
            Increment::GoalReached => self.sound(SoundId::Goal, out),
            Increment::Overflow => out.push(Notification::Fault(Fault::Overflow {
                slot: self.active as u8,
            })),
            Increment::Saturated => return,
        }
        out.push(Notification::Refresh);
    }

    fn count_down(&mut self, out: &mut Outcome) {
        if let Ok(Decrement::Counted) = self.store.decrement(self.active) {
            self.sound(SoundId::Decrement, out);
            out.push(Notification::Refresh);
        }
    }

    fn reset_active(&mut self, out: &mut Outcome) {
        if self.store.reset(self.active).is_ok() {
            self.sound(SoundId::Zero, out);
            out.push(Notification::Refresh);
        }
    }

    fn navigate(&mut self, forward: bool, out: &mut Outcome) {
        let next = self.store.step_visible(self.active, forward);
        // Leaving or re-entering a mode always stops a prostration run
        self.run = RunState::Paused;
        out.flush = true;
        if next == self.active {
            out.push(Notification::Refresh);
            return;
        }
        self.active = next;
        out.settings_changed = true;
        let cue = if forward {
            SoundId::Next
        } else {
            SoundId::Previous
        };
        self.sound(cue, out);
        out.push(Notification::ModeChanged(next as u8));
        out.push(Notification::Refresh);
    }

    fn sound(&self, id: SoundId, out: &mut Outcome) {
        if self.sound_on {
            out.push(Notification::Sound(id));
        }
    }

    /// Apply a slot edit from the configuration server
    ///
    /// Invalid edits are rejected with no change.
    pub fn apply_command(&mut self, command: &SlotCommand) -> Result<Outcome, CounterError> {
        let mut out = Outcome::default();
        match command {
            SlotCommand::SetTitle { slot, title } => {
                self.store.set_title(usize::from(*slot), title.as_str())?;
            }
            SlotCommand::SetMaxValue { slot, max_value } => {
                self.store.set_max(usize::from(*slot), *max_value)?;
            }
            SlotCommand::SetVisible { slot, visible } => {
                self.store.set_visible(usize::from(*slot), *visible)?;
                if !self.store.is_selectable(self.active) {
                    let next = self.store.step_visible(self.active, true);
                    self.active = next;
                    self.run = RunState::Paused;
                    out.settings_changed = true;
                    out.push(Notification::ModeChanged(next as u8));
                }
            }
            SlotCommand::ResetValue { slot } => {
                self.store.reset(usize::from(*slot))?;
            }
            SlotCommand::BeginEdit { slot } => {
                if usize::from(*slot) >= MODES {
                    return Err(CounterError::InvalidSlot);
                }
                self.view = View::Editing(*slot);
            }
            SlotCommand::EndEdit => {
                self.view = View::Viewing;
                out.flush = true;
            }
        }
        out.push(Notification::Refresh);
        Ok(out)
    }
}
