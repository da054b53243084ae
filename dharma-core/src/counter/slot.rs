//! A single counter slot

use crate::config::{SlotDefault, SlotKind, SlotRecord, Title};

/// Result of an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Increment {
    /// Counted, goal not crossed
    Counted,
    /// Counted and the value reached `max_value` for the first time since reset
    GoalReached,
    /// Value hit the representable maximum and was clamped
    Overflow,
    /// Already clamped; nothing changed
    Saturated,
}

/// Result of a decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decrement {
    /// Value went down by one
    Counted,
    /// Value was already zero; nothing changed
    AtZero,
}

/// One counter mode's state
///
/// `max_value` is a goal, not a cap: the value may run past it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterSlot {
    /// Display title
    pub title: Title,
    /// Current count
    pub value: u32,
    /// Goal value, always non-zero
    pub max_value: u32,
    /// Shown in mode navigation
    pub visible: bool,
    /// Changed since last persist
    pub dirty: bool,
    /// Counting kind
    pub kind: SlotKind,
    /// Goal already announced since the last reset
    goal_reached: bool,
    /// Overflow already reported
    saturated: bool,
}

impl CounterSlot {
    /// Fresh slot from a default table entry
    pub fn from_default(default: &SlotDefault) -> Self {
        Self {
            title: default.title.clone(),
            value: 0,
            max_value: default.max_value.max(1),
            visible: default.visible,
            dirty: false,
            kind: default.kind,
            goal_reached: false,
            saturated: false,
        }
    }

    /// Restore a slot from its stored record
    ///
    /// `kind` is not persisted; it comes from the slot table.
    pub fn from_record(record: SlotRecord, kind: SlotKind) -> Self {
        Self {
            title: record.title,
            value: record.value,
            max_value: record.max_value.max(1),
            visible: record.visible,
            dirty: false,
            kind,
            goal_reached: record.goal_reached,
            saturated: record.saturated && record.value == u32::MAX,
        }
    }

    /// Record for persisting this slot at `index`
    pub fn to_record(&self, index: u8) -> SlotRecord {
        SlotRecord::new(
            index,
            self.title.clone(),
            self.value,
            self.max_value,
            self.visible,
        )
        .with_latches(self.goal_reached, self.saturated)
    }

    /// Check if the goal has been reached since the last reset
    pub fn goal_reached(&self) -> bool {
        self.goal_reached
    }

    /// Progress towards the goal in percent, capped at 100
    pub fn progress_percent(&self) -> u8 {
        let percent = u64::from(self.value) * 100 / u64::from(self.max_value);
        percent.min(100) as u8
    }

    pub(crate) fn increment(&mut self) -> Increment {
        if self.value == u32::MAX {
            if self.saturated {
                return Increment::Saturated;
            }
            self.saturated = true;
            return Increment::Overflow;
        }

        self.value += 1;
        self.dirty = true;

        if self.value == u32::MAX {
            self.saturated = true;
            return Increment::Overflow;
        }
        if !self.goal_reached && self.value >= self.max_value {
            self.goal_reached = true;
            return Increment::GoalReached;
        }
        Increment::Counted
    }

    pub(crate) fn decrement(&mut self) -> Decrement {
        if self.value == 0 {
            return Decrement::AtZero;
        }
        self.value -= 1;
        self.dirty = true;
        self.saturated = false;
        Decrement::Counted
    }

    pub(crate) fn reset(&mut self) {
        self.value = 0;
        self.goal_reached = false;
        self.saturated = false;
        self.dirty = true;
    }

    pub(crate) fn set_max(&mut self, max_value: u32) {
        self.max_value = max_value;
        // Raising the goal above the current value re-arms the cue
        self.goal_reached = self.value >= max_value;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_slots;

    #[test]
    fn test_goal_fires_once() {
        let mut slot = CounterSlot::from_default(&default_slots()[0]);
        let results: std::vec::Vec<Increment> = (0..8).map(|_| slot.increment()).collect();
        assert_eq!(results[6], Increment::GoalReached);
        assert_eq!(
            results
                .iter()
                .filter(|r| **r == Increment::GoalReached)
                .count(),
            1
        );
        assert_eq!(slot.value, 8);
        assert!(slot.dirty);
    }

    #[test]
    fn test_overflow_reported_once() {
        let mut slot = CounterSlot::from_default(&default_slots()[4]);
        slot.value = u32::MAX - 1;
        assert_eq!(slot.increment(), Increment::Overflow);
        assert_eq!(slot.value, u32::MAX);
        assert_eq!(slot.increment(), Increment::Saturated);
        assert_eq!(slot.increment(), Increment::Saturated);
        assert_eq!(slot.value, u32::MAX);

        // Coming back down re-arms the report
        assert_eq!(slot.decrement(), Decrement::Counted);
        assert_eq!(slot.increment(), Increment::Overflow);
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut slot = CounterSlot::from_default(&default_slots()[0]);
        assert_eq!(slot.decrement(), Decrement::AtZero);
        assert_eq!(slot.value, 0);
        assert!(!slot.dirty);
    }

    #[test]
    fn test_reset_rearms_goal() {
        let mut slot = CounterSlot::from_default(&default_slots()[0]);
        for _ in 0..7 {
            slot.increment();
        }
        assert!(slot.goal_reached());
        slot.reset();
        assert_eq!(slot.value, 0);
        assert!(!slot.goal_reached());
        let reached = (0..7).filter(|_| slot.increment() == Increment::GoalReached);
        assert_eq!(reached.count(), 1);
    }

    #[test]
    fn test_progress_percent() {
        let mut slot = CounterSlot::from_default(&default_slots()[2]);
        slot.value = 54;
        assert_eq!(slot.progress_percent(), 50);
        slot.value = 500;
        assert_eq!(slot.progress_percent(), 100);
    }

    #[test]
    fn test_goal_latch_survives_record() {
        let mut slot = CounterSlot::from_default(&default_slots()[0]);
        for _ in 0..8 {
            slot.increment();
        }
        slot.decrement();
        slot.decrement();
        assert_eq!(slot.value, 6);

        let mut restored = CounterSlot::from_record(slot.to_record(0), slot.kind);
        slot.dirty = false;
        assert_eq!(restored, slot);
        // Climbing back past the goal does not cue it again
        assert_eq!(restored.increment(), Increment::Counted);
        assert_eq!(restored.increment(), Increment::Counted);
    }

    #[test]
    fn test_restored_slot_knows_goal_state() {
        let record = SlotRecord::new(0, crate::config::make_title("x"), 9, 7, true);
        let slot = CounterSlot::from_record(record, SlotKind::Mala);
        assert!(slot.goal_reached());
        assert!(!slot.dirty);
    }
}
