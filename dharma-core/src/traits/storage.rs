//! Persistent settings storage
//!
//! Key-value storage for counter slots and device settings. Flash-backed
//! implementations handle wear leveling; every value is written as one
//! complete record so a torn write never mixes old and new fields.

use crate::config::MODES;

/// Storage keys for persisted data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageKey {
    /// Device settings record (active mode, sound, boot count, AP credentials)
    Device,
    /// Counter slot record, keyed by slot index
    Slot(u8),
}

const DEVICE_KEY: u8 = 0x00;
const SLOT_KEY_BASE: u8 = 0x10;

impl StorageKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        match self {
            StorageKey::Device => DEVICE_KEY,
            StorageKey::Slot(index) => SLOT_KEY_BASE + index,
        }
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            DEVICE_KEY => Some(StorageKey::Device),
            v if (SLOT_KEY_BASE..SLOT_KEY_BASE + MODES as u8).contains(&v) => {
                Some(StorageKey::Slot(v - SLOT_KEY_BASE))
            }
            _ => None,
        }
    }
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Flash operation failed
    Flash,
    /// Storage operation failed
    Storage,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Data corrupted or invalid
    Corrupted,
    /// Storage is full
    Full,
}

/// Settings storage trait
///
/// Calls must complete in bounded time; the control loop invokes them only
/// at flush points, never per tick.
pub trait SettingsStorage {
    /// Read a value by key into the provided buffer
    ///
    /// Returns the number of bytes read.
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a complete value by key, replacing any previous value
    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError>;
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        let mut keys = std::vec![StorageKey::Device];
        keys.extend((0..MODES as u8).map(StorageKey::Slot));

        for key in keys {
            assert_eq!(StorageKey::from_u8(key.as_u8()), Some(key));
        }
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(StorageKey::from_u8(0x01), None);
        assert_eq!(StorageKey::from_u8(SLOT_KEY_BASE + MODES as u8), None);
        assert_eq!(StorageKey::from_u8(0xFF), None);
    }
}
