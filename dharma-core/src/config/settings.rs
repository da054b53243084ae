//! Device-wide persisted settings
//!
//! Loaded once at boot; written back whenever the active mode, sound flag
//! or credentials change, and once per boot for the boot counter.

use super::credentials::ApCredentials;
use super::record::{DeviceRecord, RecordError, MAX_RECORD_SIZE};
use crate::error::PersistError;
use crate::traits::{SettingsStorage, StorageError, StorageKey};

/// Outcome of loading the settings record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsLoad {
    /// Record read and validated
    Restored,
    /// Nothing stored yet (first boot)
    Missing,
    /// Storage read failed; defaults in use
    StorageFault(StorageError),
    /// Record present but invalid; defaults in use
    Corrupted(RecordError),
}

/// Runtime copy of the persisted device settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceSettings {
    /// Last active mode index
    pub active_mode: u8,
    /// Audio feedback enabled
    pub sound_on: bool,
    /// Number of boots so far
    pub boot_count: u32,
    /// Configuration access point credentials
    pub credentials: ApCredentials,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            active_mode: 0,
            sound_on: true,
            boot_count: 0,
            credentials: ApCredentials::default(),
        }
    }
}

impl DeviceSettings {
    /// Load settings, falling back to defaults
    pub fn load(storage: &mut impl SettingsStorage) -> (Self, SettingsLoad) {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let len = match storage.read(StorageKey::Device, &mut buffer) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return (Self::default(), SettingsLoad::Missing),
            Err(e) => return (Self::default(), SettingsLoad::StorageFault(e)),
        };

        match DeviceRecord::decode(&buffer[..len]) {
            Ok(record) => (
                Self {
                    active_mode: record.active_mode,
                    sound_on: record.sound_on,
                    boot_count: record.boot_count,
                    credentials: record.credentials,
                },
                SettingsLoad::Restored,
            ),
            Err(e) => (Self::default(), SettingsLoad::Corrupted(e)),
        }
    }

    /// Write the settings as one record
    pub fn persist(&self, storage: &mut impl SettingsStorage) -> Result<(), PersistError> {
        let record = DeviceRecord::new(
            self.active_mode,
            self.sound_on,
            self.boot_count,
            self.credentials.clone(),
        );
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let bytes = record.encode(&mut buffer)?;
        storage.write(StorageKey::Device, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStorage;

    #[test]
    fn test_missing_settings_use_defaults() {
        let mut storage = MemoryStorage::new();
        let (settings, load) = DeviceSettings::load(&mut storage);
        assert_eq!(load, SettingsLoad::Missing);
        assert_eq!(settings, DeviceSettings::default());
    }

    #[test]
    fn test_persist_then_load() {
        let mut storage = MemoryStorage::new();
        let settings = DeviceSettings {
            active_mode: 5,
            sound_on: false,
            boot_count: 12,
            credentials: ApCredentials::new("Gompa", "12345678").unwrap(),
        };
        settings.persist(&mut storage).unwrap();

        let (loaded, load) = DeviceSettings::load(&mut storage);
        assert_eq!(load, SettingsLoad::Restored);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_corrupted_settings_use_defaults() {
        let mut storage = MemoryStorage::new();
        storage.insert_raw(StorageKey::Device, &[0xDE, 0xAD, 0xBE, 0xEF]);

        let (settings, load) = DeviceSettings::load(&mut storage);
        assert!(matches!(load, SettingsLoad::Corrupted(_)));
        assert_eq!(settings, DeviceSettings::default());
    }

    #[test]
    fn test_read_fault_uses_defaults() {
        let mut storage = MemoryStorage::new();
        storage.fail_reads(true);

        let (_, load) = DeviceSettings::load(&mut storage);
        assert_eq!(load, SettingsLoad::StorageFault(StorageError::Flash));
    }
}
