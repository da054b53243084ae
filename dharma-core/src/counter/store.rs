//! The fixed set of counter slots
//!
//! Mutations only mark slots dirty. Nothing reaches storage until
//! [`CounterStore::persist`] is called, which bounds flash wear to one
//! record write per changed slot per flush.

use super::slot::{CounterSlot, Decrement, Increment};
use crate::config::{make_title, SlotDefault, SlotRecord, MAX_RECORD_SIZE, MAX_TITLE_LEN, MODES};
use crate::error::PersistError;
use crate::traits::{SettingsStorage, StorageError, StorageKey};

/// Errors from counter store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterError {
    /// Slot index out of range
    InvalidSlot,
    /// Goal value must be at least 1
    InvalidMax,
    /// Title empty or longer than the title buffer
    InvalidTitle,
}

/// Per-slot result of [`CounterStore::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotLoad {
    /// Record read and validated
    Restored,
    /// Nothing stored yet
    Missing,
    /// Record failed validation; defaults in use
    Corrupted,
    /// Storage read failed; defaults in use
    Failed(StorageError),
}

/// Summary of a full load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoadReport {
    /// Per-slot outcome
    pub slots: [SlotLoad; MODES],
}

impl LoadReport {
    /// Number of slots restored from storage
    pub fn restored(&self) -> usize {
        self.count(|s| s == SlotLoad::Restored)
    }

    /// Number of slots with no record yet
    pub fn missing(&self) -> usize {
        self.count(|s| s == SlotLoad::Missing)
    }

    /// Number of slots whose record failed validation
    pub fn corrupted(&self) -> usize {
        self.count(|s| s == SlotLoad::Corrupted)
    }

    /// Number of slots whose read failed
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, SlotLoad::Failed(_)))
    }

    fn count(&self, f: impl Fn(SlotLoad) -> bool) -> usize {
        self.slots.iter().filter(|s| f(**s)).count()
    }
}

/// All counter slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterStore {
    slots: [CounterSlot; MODES],
}

impl CounterStore {
    /// Create a store with every slot at its default
    pub fn new(defaults: &[SlotDefault; MODES]) -> Self {
        Self {
            slots: core::array::from_fn(|i| CounterSlot::from_default(&defaults[i])),
        }
    }

    /// Load every slot from storage
    ///
    /// Slots that cannot be read keep their defaults and are marked dirty
    /// so the next flush rewrites them.
    pub fn load(
        defaults: &[SlotDefault; MODES],
        storage: &mut impl SettingsStorage,
    ) -> (Self, LoadReport) {
        let mut store = Self::new(defaults);
        let mut report = LoadReport {
            slots: [SlotLoad::Missing; MODES],
        };
        let mut buffer = [0u8; MAX_RECORD_SIZE];

        for (i, slot) in store.slots.iter_mut().enumerate() {
            let index = i as u8;
            report.slots[i] = match storage.read(StorageKey::Slot(index), &mut buffer) {
                Ok(len) => match SlotRecord::decode(&buffer[..len], index) {
                    Ok(record) => {
                        *slot = CounterSlot::from_record(record, defaults[i].kind);
                        SlotLoad::Restored
                    }
                    Err(_) => {
                        slot.dirty = true;
                        SlotLoad::Corrupted
                    }
                },
                Err(StorageError::NotFound) => SlotLoad::Missing,
                Err(e) => {
                    slot.dirty = true;
                    SlotLoad::Failed(e)
                }
            };
        }

        (store, report)
    }

    /// Write every dirty slot as one complete record
    ///
    /// Stops at the first failure; slots not yet written stay dirty.
    /// Returns the number of records written.
    pub fn persist(&mut self, storage: &mut impl SettingsStorage) -> Result<usize, PersistError> {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let mut written = 0;

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if !slot.dirty {
                continue;
            }
            let record = slot.to_record(i as u8);
            let bytes = record.encode(&mut buffer)?;
            storage.write(StorageKey::Slot(i as u8), bytes)?;
            slot.dirty = false;
            written += 1;
        }

        Ok(written)
    }

    /// Check if any slot awaits a flush
    pub fn has_dirty(&self) -> bool {
        self.slots.iter().any(|s| s.dirty)
    }

    /// Read access to one slot
    pub fn slot(&self, index: usize) -> Result<&CounterSlot, CounterError> {
        self.slots.get(index).ok_or(CounterError::InvalidSlot)
    }

    /// All slots
    pub fn slots(&self) -> &[CounterSlot; MODES] {
        &self.slots
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut CounterSlot, CounterError> {
        self.slots.get_mut(index).ok_or(CounterError::InvalidSlot)
    }

    /// Count one up
    pub fn increment(&mut self, index: usize) -> Result<Increment, CounterError> {
        Ok(self.slot_mut(index)?.increment())
    }

    /// Count one down, stopping at zero
    pub fn decrement(&mut self, index: usize) -> Result<Decrement, CounterError> {
        Ok(self.slot_mut(index)?.decrement())
    }

    /// Set the value back to zero
    pub fn reset(&mut self, index: usize) -> Result<(), CounterError> {
        self.slot_mut(index)?.reset();
        Ok(())
    }

    /// Change the goal value
    pub fn set_max(&mut self, index: usize, max_value: u32) -> Result<(), CounterError> {
        if max_value == 0 {
            return Err(CounterError::InvalidMax);
        }
        let slot = self.slot_mut(index)?;
        if slot.max_value != max_value {
            slot.set_max(max_value);
        }
        Ok(())
    }

    /// Show or hide a slot in mode navigation
    pub fn set_visible(&mut self, index: usize, visible: bool) -> Result<(), CounterError> {
        let slot = self.slot_mut(index)?;
        if slot.visible != visible {
            slot.visible = visible;
            slot.dirty = true;
        }
        Ok(())
    }

    /// Rename a slot
    pub fn set_title(&mut self, index: usize, title: &str) -> Result<(), CounterError> {
        if title.is_empty() || title.len() > MAX_TITLE_LEN {
            return Err(CounterError::InvalidTitle);
        }
        let slot = self.slot_mut(index)?;
        if slot.title.as_str() != title {
            slot.title = make_title(title);
            slot.dirty = true;
        }
        Ok(())
    }

    /// Check if at least one slot is visible
    pub fn any_visible(&self) -> bool {
        self.slots.iter().any(|s| s.visible)
    }

    /// First slot shown in navigation, or 0 when all are hidden
    pub fn first_visible(&self) -> usize {
        self.slots.iter().position(|s| s.visible).unwrap_or(0)
    }

    /// Check if `index` can be the active mode
    ///
    /// With every slot hidden, all slots are selectable.
    pub fn is_selectable(&self, index: usize) -> bool {
        match self.slots.get(index) {
            Some(slot) => slot.visible || !self.any_visible(),
            None => false,
        }
    }

    /// Next selectable slot after `from`, wrapping around
    ///
    /// Skips hidden slots unless every slot is hidden, in which case it
    /// cycles through all of them.
    pub fn step_visible(&self, from: usize, forward: bool) -> usize {
        let all_hidden = !self.any_visible();
        let mut index = from % MODES;
        for _ in 0..MODES {
            index = if forward {
                (index + 1) % MODES
            } else {
                (index + MODES - 1) % MODES
            };
            if all_hidden || self.slots[index].visible {
                return index;
            }
        }
        from % MODES
    }

    #[cfg(test)]
    pub(crate) fn force_value(&mut self, index: usize, value: u32) {
        self.slots[index].value = value;
        self.slots[index].dirty = true;
    }
}
